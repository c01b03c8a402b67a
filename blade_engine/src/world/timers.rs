use serde::{Deserialize, Serialize};

use crate::callback::ActionCallback;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Timer {
    remaining: f32,
    callback: ActionCallback,
}

/// Plain countdowns used by `wait` steps.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timers {
    entries: Vec<Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, seconds: f32, callback: ActionCallback) {
        self.entries.push(Timer {
            remaining: seconds,
            callback,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn update(&mut self, dt: f32) -> Vec<ActionCallback> {
        let mut fired = Vec::new();
        self.entries.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                fired.push(timer.callback);
                false
            } else {
                true
            }
        });
        fired
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAnimation {
    pub actor: String,
    pub animation: String,
    pub remaining: f32,
    pub callback: ActionCallback,
}

/// Tracks animations somebody is waiting on. The renderer owns playback;
/// this only knows how long each one lasts.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationTracker {
    pending: Vec<PendingAnimation>,
}

impl AnimationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the pending completion for an actor, if any. Called whenever
    /// that actor starts a different animation.
    pub fn interrupt(&mut self, actor: &str) -> Option<PendingAnimation> {
        let index = self.pending.iter().position(|entry| entry.actor == actor)?;
        Some(self.pending.remove(index))
    }

    pub fn watch(&mut self, entry: PendingAnimation) {
        self.pending.push(entry);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn update(&mut self, dt: f32) -> Vec<PendingAnimation> {
        let mut finished = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            self.pending[index].remaining -= dt;
            if self.pending[index].remaining <= 0.0 {
                finished.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RunnerId;

    fn cb(ticket: u32) -> ActionCallback {
        ActionCallback::new(RunnerId(2), ticket)
    }

    #[test]
    fn timers_fire_when_expired() {
        let mut timers = Timers::new();
        timers.start(0.5, cb(1));
        timers.start(1.0, cb(2));
        assert_eq!(timers.update(0.5), vec![cb(1)]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.update(0.25), Vec::new());
        assert_eq!(timers.update(0.25), vec![cb(2)]);
        assert!(timers.is_empty());
    }

    #[test]
    fn zero_length_animation_finishes_next_update() {
        let mut tracker = AnimationTracker::new();
        tracker.watch(PendingAnimation {
            actor: "bob".into(),
            animation: "wave".into(),
            remaining: 0.0,
            callback: cb(3),
        });
        let done = tracker.update(0.016);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].callback, cb(3));
        assert!(tracker.is_empty());
    }

    #[test]
    fn interrupt_returns_pending_entry() {
        let mut tracker = AnimationTracker::new();
        tracker.watch(PendingAnimation {
            actor: "bob".into(),
            animation: "wave".into(),
            remaining: 3.0,
            callback: cb(5),
        });
        assert!(tracker.interrupt("alice").is_none());
        assert_eq!(tracker.interrupt("bob").map(|entry| entry.callback), Some(cb(5)));
    }
}
