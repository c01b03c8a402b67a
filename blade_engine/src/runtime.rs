use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use blade_engine::{ActionKind, EngineConfig, SaveGame, Story, VerbScheduler};
use serde::Serialize;

use crate::cli::{RunArgs, ScriptedInput, StorySource};

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    frame: u32,
    event: &'a str,
}

pub fn list_actions() {
    for kind in ActionKind::ALL {
        println!("{:<22} {}", kind.tag(), kind.description());
        for property in kind.properties() {
            let default = match (property.required, property.default) {
                (true, _) => String::from("required"),
                (false, Some(value)) => format!("default {value}"),
                (false, None) => String::from("optional"),
            };
            println!(
                "    {name:<14} {default:<16} {description}",
                name = property.name,
                description = property.description
            );
        }
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config =
        EngineConfig::from_json_file(args.config.as_deref()).context("loading engine config")?;
    let frame_delta = config.frame_delta;
    let story = match &args.story {
        StorySource::Demo => Story::demo()?,
        StorySource::File(path) => Story::from_path(path)?,
    };

    let mut scheduler = match args.load.as_deref() {
        Some(path) => load_game(path, &story, config)?,
        None => story.build_scheduler(config)?,
    };

    if let Some(dialog) = args.dialog.as_deref() {
        if !scheduler.world_mut().start_dialog(dialog) {
            bail!("story has no dialog '{dialog}'");
        }
    }

    let mut stamps: Vec<u32> = vec![0; scheduler.world().events().len()];
    let mut script = args.script.iter().peekable();
    for frame in 0..args.frames {
        while let Some(step) = script.next_if(|step| step.frame <= frame) {
            apply_step(&mut scheduler, &step.input);
        }
        scheduler.update(frame_delta);
        stamps.resize(scheduler.world().events().len(), frame);
    }
    for step in script {
        log::warn!("scripted input at frame {} never ran", step.frame);
    }

    let world = scheduler.world();
    println!(
        "Simulated {} frames ({:.2}s of game time)",
        args.frames,
        world.clock()
    );
    println!("Properties:");
    for (name, value) in world.custom_properties() {
        println!("  {name} = {value}");
    }
    let live: Vec<String> = scheduler
        .runners()
        .map(|runner| format!("{} at step {}", runner.key(), runner.cursor()))
        .collect();
    if live.is_empty() {
        println!("No verbs running");
    } else {
        println!("Verbs still running: {}", live.join(", "));
    }

    if let Some(path) = args.event_log_json.as_deref() {
        let records: Vec<EventRecord<'_>> = world
            .events()
            .iter()
            .zip(&stamps)
            .map(|(event, frame)| EventRecord {
                frame: *frame,
                event,
            })
            .collect();
        let json =
            serde_json::to_string_pretty(&records).context("serializing event log to JSON")?;
        write_file(path, json.as_bytes())?;
        println!("Saved event log to {}", path.display());
    }

    if args.save.is_some() || args.save_json.is_some() {
        let save = scheduler.save().context("snapshotting game")?;
        if let Some(path) = args.save.as_deref() {
            write_file(path, &save.to_bytes()?)?;
            println!("Saved game to {}", path.display());
        }
        if let Some(path) = args.save_json.as_deref() {
            write_file(path, save.to_json_string()?.as_bytes())?;
            println!("Saved game JSON to {}", path.display());
        }
    }

    Ok(())
}

fn apply_step(scheduler: &mut VerbScheduler, input: &ScriptedInput) {
    let result = match input {
        ScriptedInput::Trigger { verb, actor } => scheduler
            .trigger(verb, actor.as_deref(), None)
            .map(|id| format!("started {verb} as runner {id}")),
        ScriptedInput::SelectOption(index) => {
            scheduler
                .select_dialog_option(*index)
                .map(|runner| match runner {
                    Some(id) => format!("option {index} started runner {id}"),
                    None => format!("option {index} selected"),
                })
        }
    };
    match result {
        Ok(message) => log::debug!("{message}"),
        Err(err) => {
            eprintln!("[blade_engine] {err}");
            scheduler
                .world_mut()
                .log_event(format!("input.rejected {err}"));
        }
    }
}

fn load_game(path: &Path, story: &Story, config: EngineConfig) -> Result<VerbScheduler> {
    let bytes = fs::read(path).with_context(|| format!("reading save {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let decoded = if is_json {
        let json = String::from_utf8(bytes)
            .map_err(|_| anyhow!("save {} is not UTF-8 JSON", path.display()))?;
        SaveGame::from_json_str(&json)
    } else {
        SaveGame::from_bytes(&bytes)
    };
    let save = decoded.with_context(|| format!("decoding save {}", path.display()))?;

    let (scheduler, report) = VerbScheduler::load(save, story.verb_manager()?, config);
    println!(
        "Loaded {} with {} running verbs",
        path.display(),
        report.restored.len()
    );
    for (runner, err) in &report.failed {
        eprintln!("[blade_engine] dropped runner {runner}: {err}");
    }
    Ok(scheduler)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}
