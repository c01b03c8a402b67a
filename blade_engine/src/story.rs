//! JSON content description loaded into a scheduler.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::scheduler::VerbScheduler;
use crate::verb::{VerbDefinition, VerbManager};
use crate::world::{ActorSnapshot, Dialog, World};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryActor {
    #[serde(flatten)]
    pub actor: ActorSnapshot,
    #[serde(default)]
    pub verbs: Vec<VerbDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub actors: Vec<StoryActor>,
    #[serde(default)]
    pub dialogs: Vec<Dialog>,
    #[serde(default)]
    pub verbs: Vec<VerbDefinition>,
}

impl Story {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing story JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading story {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading story {}", path.display()))
    }

    /// Verb catalog declared by the story.
    pub fn verb_manager(&self) -> Result<VerbManager> {
        let mut verbs = VerbManager::new();
        for definition in &self.verbs {
            verbs.add_world_verb(definition.build()?);
        }
        for entry in &self.actors {
            for definition in &entry.verbs {
                let verb = definition
                    .build()
                    .with_context(|| format!("building verbs of actor '{}'", entry.actor.id))?;
                verbs.add_actor_verb(&entry.actor.id, verb);
            }
        }
        Ok(verbs)
    }

    /// Initial world state declared by the story.
    pub fn world(&self, config: EngineConfig) -> Result<World> {
        let mut world = World::new(config);
        for (name, value) in &self.properties {
            world.set_custom_property(name, value.clone());
        }
        for entry in &self.actors {
            world.add_actor(entry.actor.clone());
        }
        if let Some(player) = &self.player {
            if world.actor(player, true).is_none() {
                bail!("player '{player}' is not one of the story's actors");
            }
            world.set_player(Some(player.clone()));
        }
        for dialog in &self.dialogs {
            if world.actor(&dialog.actor, true).is_none() {
                bail!(
                    "dialog '{}' refers to unknown actor '{}'",
                    dialog.id,
                    dialog.actor
                );
            }
            world.add_dialog(dialog.clone());
        }
        Ok(world)
    }

    pub fn build_scheduler(&self, config: EngineConfig) -> Result<VerbScheduler> {
        let verbs = self.verb_manager()?;
        let world = self.world(config)?;
        Ok(VerbScheduler::new(world, verbs))
    }

    /// Small tavern scene used by the CLI `--demo` flag and the tests.
    pub fn demo() -> Result<Self> {
        Self::from_json_str(DEMO_STORY)
    }
}

const DEMO_STORY: &str = r#"{
  "player": "ada",
  "properties": { "coins": "3", "mood": "curious" },
  "actors": [
    {
      "id": "ada", "x": 120, "y": 40, "width": 30, "height": 80,
      "animation": "stand.left",
      "animations": { "wave": 0.5, "stand.left": 0.0 }
    },
    {
      "id": "barkeep", "x": 300, "y": 40, "width": 40, "height": 90,
      "animation": "idle",
      "animations": { "pour": 0.75 },
      "verbs": [
        {
          "id": "order",
          "actions": [
            { "type": "say_dialog" },
            { "type": "add_value_to_property", "prop": "coins", "value": -2 },
            { "type": "animation", "actor": "barkeep", "animation": "pour", "wait": true },
            { "type": "set_property", "prop": "drink", "value": "served" }
          ]
        },
        {
          "id": "nevermind",
          "actions": [ { "type": "say_dialog" } ]
        }
      ]
    },
    {
      "id": "door", "x": 20, "y": 0, "width": 50, "height": 120,
      "state": "closed", "animated": false,
      "verbs": [
        {
          "id": "lookat", "state": "closed",
          "actions": [
            { "type": "say", "actor": "ada", "text": "The door is shut." },
            { "type": "set_state", "actor": "door", "state": "open" },
            { "type": "tween", "actor": "door", "property": "rotation", "value": 90, "duration": 0.5, "interpolation": "sine_out" }
          ]
        },
        {
          "id": "lookat", "state": "open",
          "actions": [
            { "type": "say", "actor": "ada", "text": "Fresh air at last.", "textType": "plain" }
          ]
        }
      ]
    }
  ],
  "dialogs": [
    {
      "id": "bar", "actor": "barkeep",
      "options": [
        { "text": "A drink, please.", "response_text": "Coming right up.", "verb": "order" },
        { "text": "", "response_text": "Suit yourself.", "verb": "nevermind" }
      ]
    }
  ],
  "verbs": [
    {
      "id": "intro",
      "actions": [
        { "type": "say", "actor": "ada", "text": "What a place." },
        { "type": "animation", "actor": "ada", "animation": "wave", "wait": true },
        { "type": "wait", "time": 0.5 },
        { "type": "add_value_to_property", "prop": "coins", "value": 5 },
        { "type": "run_verb", "verb": "lookat", "actor": "door" },
        { "type": "tween", "actor": "door", "property": "alpha", "value": 0.5, "duration": 0.25, "repeat": "yoyo", "count": 2 },
        { "type": "set_property", "prop": "intro", "value": "done" }
      ]
    }
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_story_builds() {
        let story = Story::demo().expect("demo parses");
        let verbs = story.verb_manager().expect("verbs build");
        assert_eq!(verbs.world_verbs().count(), 1);
        assert_eq!(verbs.actor_verbs("door").count(), 2);
        let world = story.world(EngineConfig::default()).expect("world builds");
        assert_eq!(world.player_id(), Some("ada"));
        assert_eq!(world.custom_property("coins"), Some("3"));
        assert_eq!(
            world.actor("door", false).and_then(|door| door.state.as_deref()),
            Some("closed")
        );
    }

    #[test]
    fn unknown_player_is_rejected() {
        let story = Story::from_json_str(r#"{ "player": "nobody" }"#).expect("parses");
        assert!(story.world(EngineConfig::default()).is_err());
    }

    #[test]
    fn bad_action_names_its_verb() {
        let story = Story::from_json_str(
            r#"{ "verbs": [ { "id": "oops", "actions": [ { "type": "fly" } ] } ] }"#,
        )
        .expect("parses");
        let err = story.verb_manager().unwrap_err();
        assert!(format!("{err:#}").contains("oops"));
    }
}
