//! Serializable snapshots of runners and of a whole game.
//!
//! Actions are stored as tagged JSON objects so a snapshot stays readable
//! and a single unknown tag only invalidates the runner that holds it.

use blade_save::{decode_save, encode_save, SaveError, SaveKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::callback::{ActionCallback, RunnerId};
use crate::verb::VerbKey;
use crate::world::World;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unknown action type '{0}'")]
    UnknownActionType(String),
    #[error("action snapshot has no \"type\" tag")]
    MissingTag,
    #[error("malformed '{tag}' snapshot: {reason}")]
    Malformed { tag: String, reason: String },
    #[error("runner {runner} cursor {cursor} is past its {len} actions")]
    CursorOutOfRange {
        runner: RunnerId,
        cursor: usize,
        len: usize,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to parse JSON save: {0}")]
    Json(#[source] serde_json::Error),
    #[error(transparent)]
    Container(#[from] SaveError),
}

/// One action as `{ "type": <tag>, ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSnapshot(Map<String, Value>);

impl ActionSnapshot {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub id: RunnerId,
    pub key: VerbKey,
    pub actions: Vec<ActionSnapshot>,
    pub cursor: usize,
    pub waiting: bool,
    #[serde(default)]
    pub pending: Option<ActionCallback>,
    pub next_ticket: u32,
    #[serde(default)]
    pub on_complete: Option<ActionCallback>,
}

impl RunnerSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(encode_save(SaveKind::Runner, self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(decode_save(SaveKind::Runner, bytes)?)
    }
}

/// Everything needed to continue a game: the world with its running
/// effects and every live runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveGame {
    pub world: World,
    pub runners: Vec<RunnerSnapshot>,
    pub next_runner: u32,
}

impl SaveGame {
    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError::Json)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(encode_save(SaveKind::Game, self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(decode_save(SaveKind::Game, bytes)?)
    }
}

/// Outcome of restoring a save. Runners that failed to restore are dropped;
/// the rest of the game loads normally.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub restored: Vec<RunnerId>,
    pub failed: Vec<(RunnerId, SnapshotError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
