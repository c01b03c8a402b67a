use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Drives a story's verbs frame by frame and saves or resumes the run",
    version
)]
pub struct Args {
    /// Story JSON describing actors, dialogs and verbs
    #[arg(long)]
    pub story: Option<PathBuf>,

    /// Use the built-in tavern story instead of --story
    #[arg(long)]
    pub demo: bool,

    /// Print every action kind with its properties and exit
    #[arg(long)]
    pub list_actions: bool,

    /// Optional JSON engine config (subtitle pacing, frame delta)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Resume from a save written by --save or --save-json
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Dialog to open before the first frame
    #[arg(long, value_name = "ID")]
    pub dialog: Option<String>,

    /// Trigger a verb at a frame, e.g. `0:intro` or `30:lookat@door`
    #[arg(long, value_name = "FRAME:VERB[@ACTOR]")]
    pub trigger: Vec<String>,

    /// Pick a dialog option at a frame, e.g. `10:0`
    #[arg(long, value_name = "FRAME:INDEX")]
    pub select_option: Vec<String>,

    /// Path to write a binary save after the last frame
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Path to write a JSON save after the last frame
    #[arg(long)]
    pub save_json: Option<PathBuf>,

    /// Path to write the frame-stamped event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Raise the default log filter to debug
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    Run(RunArgs),
    ListActions { verbose: bool },
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Run(args) => args.verbose,
            Command::ListActions { verbose } => *verbose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorySource {
    Demo,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedInput {
    Trigger { verb: String, actor: Option<String> },
    SelectOption(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedStep {
    pub frame: u32,
    pub input: ScriptedInput,
}

#[derive(Debug)]
pub struct RunArgs {
    pub story: StorySource,
    pub config: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub frames: u32,
    pub dialog: Option<String>,
    pub script: Vec<ScriptedStep>,
    pub save: Option<PathBuf>,
    pub save_json: Option<PathBuf>,
    pub event_log_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if self.list_actions {
            return Ok(Command::ListActions {
                verbose: self.verbose,
            });
        }

        let story = match (self.demo, self.story) {
            (true, Some(_)) => bail!("--demo and --story are mutually exclusive"),
            (true, None) => StorySource::Demo,
            (false, Some(path)) => StorySource::File(path),
            (false, None) => bail!("one of --story or --demo is required"),
        };

        let mut script = Vec::new();
        for raw in &self.trigger {
            script.push(parse_trigger(raw).with_context(|| format!("--trigger {raw}"))?);
        }
        for raw in &self.select_option {
            script.push(parse_selection(raw).with_context(|| format!("--select-option {raw}"))?);
        }
        // stable sort keeps triggers ahead of selections within a frame
        script.sort_by_key(|step| step.frame);

        Ok(Command::Run(RunArgs {
            story,
            config: self.config,
            load: self.load,
            frames: self.frames,
            dialog: self.dialog,
            script,
            save: self.save,
            save_json: self.save_json,
            event_log_json: self.event_log_json,
            verbose: self.verbose,
        }))
    }
}

fn split_frame(raw: &str) -> Result<(u32, &str)> {
    let Some((frame, rest)) = raw.split_once(':') else {
        bail!("expected FRAME:VALUE");
    };
    let frame = frame
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid frame '{frame}'"))?;
    Ok((frame, rest.trim()))
}

fn parse_trigger(raw: &str) -> Result<ScriptedStep> {
    let (frame, rest) = split_frame(raw)?;
    let (verb, actor) = match rest.split_once('@') {
        Some((verb, actor)) => (verb, Some(actor.to_string())),
        None => (rest, None),
    };
    if verb.is_empty() {
        bail!("missing verb name");
    }
    Ok(ScriptedStep {
        frame,
        input: ScriptedInput::Trigger {
            verb: verb.to_string(),
            actor,
        },
    })
}

fn parse_selection(raw: &str) -> Result<ScriptedStep> {
    let (frame, rest) = split_frame(raw)?;
    let index = rest
        .parse::<usize>()
        .with_context(|| format!("invalid option index '{rest}'"))?;
    Ok(ScriptedStep {
        frame,
        input: ScriptedInput::SelectOption(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Result<Command> {
        let mut argv = vec!["blade_engine"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)?.into_command()
    }

    #[test]
    fn script_steps_sorted_by_frame() {
        let Command::Run(run) = args(&[
            "--demo",
            "--trigger",
            "30:lookat@door",
            "--select-option",
            "10:1",
            "--trigger",
            "0:intro",
        ])
        .expect("parse") else {
            panic!("expected run");
        };
        assert_eq!(run.story, StorySource::Demo);
        let frames: Vec<u32> = run.script.iter().map(|step| step.frame).collect();
        assert_eq!(frames, vec![0, 10, 30]);
        assert_eq!(
            run.script[2].input,
            ScriptedInput::Trigger {
                verb: "lookat".into(),
                actor: Some("door".into())
            }
        );
    }

    #[test]
    fn story_source_required() {
        assert!(args(&[]).is_err());
        assert!(args(&["--demo", "--story", "x.json"]).is_err());
        assert!(matches!(
            args(&["--list-actions"]).expect("parse"),
            Command::ListActions { verbose: false }
        ));
    }

    #[test]
    fn malformed_steps_rejected() {
        assert!(args(&["--demo", "--trigger", "intro"]).is_err());
        assert!(args(&["--demo", "--trigger", "x:intro"]).is_err());
        assert!(args(&["--demo", "--select-option", "3:first"]).is_err());
    }
}
