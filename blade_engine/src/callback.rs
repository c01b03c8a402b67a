use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one verb runner inside a world. Ids are handed out
/// monotonically and never reused, so a stale handle can't reach a newer
/// runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerId(pub u32);

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resumption handle given to an external effect (subtitle, timer, tween,
/// animation) by a suspending action.
///
/// The handle does not point at the action. It names the runner that issued
/// it and the ticket of that runner's outstanding suspension; the runner
/// resolves it back to whichever action its cursor is on. A ticket that no
/// longer matches is ignored, which is how abandoned or duplicated
/// completions are made harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionCallback {
    pub runner: RunnerId,
    pub ticket: u32,
}

impl ActionCallback {
    pub fn new(runner: RunnerId, ticket: u32) -> Self {
        Self { runner, ticket }
    }
}

impl fmt::Display for ActionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.runner, self.ticket)
    }
}
