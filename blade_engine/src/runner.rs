//! Sequencer that walks one verb's actions.

use crate::action::{Action, Step};
use crate::callback::{ActionCallback, RunnerId};
use crate::snapshot::{RunnerSnapshot, SnapshotError};
use crate::verb::VerbKey;
use crate::world::World;

/// What a runner did with control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    /// Parked on an action; a callback will bring it back.
    Waiting,
    /// Every action ran; the runner is inert.
    Finished,
    /// The callback did not match the outstanding suspension and was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct VerbRunner {
    id: RunnerId,
    key: VerbKey,
    actions: Vec<Action>,
    cursor: usize,
    waiting: bool,
    pending: Option<ActionCallback>,
    next_ticket: u32,
    on_complete: Option<ActionCallback>,
}

impl VerbRunner {
    /// Binds a copy of a verb's actions. `on_complete` is fired into the
    /// world once the last action finishes.
    pub fn new(
        id: RunnerId,
        key: VerbKey,
        actions: Vec<Action>,
        on_complete: Option<ActionCallback>,
    ) -> Self {
        Self {
            id,
            key,
            actions,
            cursor: 0,
            waiting: false,
            pending: None,
            next_ticket: 1,
            on_complete,
        }
    }

    pub fn id(&self) -> RunnerId {
        self.id
    }

    pub fn key(&self) -> &VerbKey {
        &self.key
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.actions.len() && !self.waiting
    }

    pub fn pending_callback(&self) -> Option<ActionCallback> {
        self.pending
    }

    pub fn on_complete(&self) -> Option<ActionCallback> {
        self.on_complete
    }

    fn issue_callback(&mut self) -> ActionCallback {
        let callback = ActionCallback::new(self.id, self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        callback
    }

    /// Runs from the first action until something suspends or the list is
    /// exhausted.
    pub fn start(&mut self, world: &mut World) -> RunnerStatus {
        self.cursor = 0;
        self.waiting = false;
        self.pending = None;
        self.advance(world)
    }

    /// Forwards a completion to the action under the cursor. Callbacks that
    /// don't match the outstanding suspension are ignored.
    pub fn resume(&mut self, world: &mut World, callback: ActionCallback) -> RunnerStatus {
        if !self.waiting || self.pending != Some(callback) {
            log::warn!(
                "runner {} ({}) ignoring stale callback {callback}",
                self.id,
                self.key
            );
            return RunnerStatus::Stale;
        }
        self.waiting = false;
        self.pending = None;

        let next = self.issue_callback();
        let Some(action) = self.actions.get_mut(self.cursor) else {
            return self.finish(world);
        };
        let tag = action.kind().tag();
        match action.resume(world, next) {
            Ok(Step::Suspend) => {
                self.suspend(next);
                return RunnerStatus::Waiting;
            }
            Ok(Step::Complete) => {
                world.log_event(format!("action.complete {} {tag}", self.key));
            }
            Err(err) => {
                log::warn!("runner {} ({}): {tag} failed: {err}", self.id, self.key);
                world.log_event(format!("action.error {} {tag}", self.key));
            }
        }
        self.cursor += 1;
        self.advance(world)
    }

    fn advance(&mut self, world: &mut World) -> RunnerStatus {
        while self.cursor < self.actions.len() {
            let callback = self.issue_callback();
            let action = &mut self.actions[self.cursor];
            let tag = action.kind().tag();
            match action.run(world, callback) {
                Ok(Step::Suspend) => {
                    world.log_event(format!("action.suspend {} {tag}", self.key));
                    self.suspend(callback);
                    return RunnerStatus::Waiting;
                }
                Ok(Step::Complete) => {
                    world.log_event(format!("action.complete {} {tag}", self.key));
                }
                Err(err) => {
                    log::warn!("runner {} ({}): {tag} failed: {err}", self.id, self.key);
                    world.log_event(format!("action.error {} {tag}", self.key));
                }
            }
            self.cursor += 1;
        }
        self.finish(world)
    }

    fn suspend(&mut self, callback: ActionCallback) {
        self.waiting = true;
        self.pending = Some(callback);
    }

    fn finish(&mut self, world: &mut World) -> RunnerStatus {
        self.cursor = self.actions.len();
        world.log_event(format!("verb.end {}", self.key));
        if let Some(callback) = self.on_complete.take() {
            world.fire(callback);
        }
        RunnerStatus::Finished
    }

    pub fn snapshot(&self) -> Result<RunnerSnapshot, SnapshotError> {
        let actions = self
            .actions
            .iter()
            .map(Action::write)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RunnerSnapshot {
            id: self.id,
            key: self.key.clone(),
            actions,
            cursor: self.cursor,
            waiting: self.waiting,
            pending: self.pending,
            next_ticket: self.next_ticket,
            on_complete: self.on_complete,
        })
    }

    pub fn restore(snapshot: &RunnerSnapshot) -> Result<Self, SnapshotError> {
        let actions = snapshot
            .actions
            .iter()
            .map(Action::read)
            .collect::<Result<Vec<_>, _>>()?;
        if snapshot.cursor > actions.len()
            || (snapshot.waiting && snapshot.cursor == actions.len())
        {
            return Err(SnapshotError::CursorOutOfRange {
                runner: snapshot.id,
                cursor: snapshot.cursor,
                len: actions.len(),
            });
        }
        Ok(Self {
            id: snapshot.id,
            key: snapshot.key.clone(),
            actions,
            cursor: snapshot.cursor,
            waiting: snapshot.waiting,
            pending: snapshot.pending,
            next_ticket: snapshot.next_ticket,
            on_complete: snapshot.on_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use serde_json::json;

    fn action(definition: serde_json::Value) -> Action {
        Action::from_definition(&definition).expect("valid action")
    }

    fn runner(actions: Vec<Action>) -> VerbRunner {
        VerbRunner::new(RunnerId(1), VerbKey::new("test", None), actions, None)
    }

    #[test]
    fn synchronous_chain_finishes_in_one_call() {
        let mut world = World::new(EngineConfig::default());
        let mut runner = runner(vec![
            action(json!({ "type": "set_property", "prop": "a", "value": "1" })),
            action(json!({ "type": "add_value_to_property", "prop": "a", "value": 2 })),
        ]);
        assert_eq!(runner.start(&mut world), RunnerStatus::Finished);
        assert!(runner.is_finished());
        assert_eq!(world.custom_property("a"), Some("3"));
        assert_eq!(world.events().last().map(String::as_str), Some("verb.end test@<world>"));
    }

    #[test]
    fn suspension_holds_cursor_until_callback() {
        let mut world = World::new(EngineConfig::default());
        let mut runner = runner(vec![
            action(json!({ "type": "wait", "time": 0.5 })),
            action(json!({ "type": "set_property", "prop": "done", "value": "yes" })),
        ]);
        assert_eq!(runner.start(&mut world), RunnerStatus::Waiting);
        assert_eq!(runner.cursor(), 0);
        assert!(runner.is_waiting());

        world.update(0.5);
        let fired = world.take_fired().expect("timer fired");
        assert_eq!(Some(fired), runner.pending_callback());
        assert_eq!(runner.resume(&mut world, fired), RunnerStatus::Finished);
        assert_eq!(world.custom_property("done"), Some("yes"));
    }

    #[test]
    fn stale_callbacks_are_ignored() {
        let mut world = World::new(EngineConfig::default());
        let mut runner = runner(vec![action(json!({ "type": "wait", "time": 1.0 }))]);
        runner.start(&mut world);
        let pending = runner.pending_callback().expect("pending");

        let wrong_ticket = ActionCallback::new(pending.runner, pending.ticket + 5);
        assert_eq!(runner.resume(&mut world, wrong_ticket), RunnerStatus::Stale);
        assert!(runner.is_waiting());

        assert_eq!(runner.resume(&mut world, pending), RunnerStatus::Finished);
        assert_eq!(runner.resume(&mut world, pending), RunnerStatus::Stale);
    }

    #[test]
    fn failing_action_is_skipped() {
        let mut world = World::new(EngineConfig::default());
        let mut runner = runner(vec![
            action(json!({ "type": "set_state", "actor": "ghost", "state": "boo" })),
            action(json!({ "type": "set_property", "prop": "after", "value": "ran" })),
        ]);
        assert_eq!(runner.start(&mut world), RunnerStatus::Finished);
        assert_eq!(world.custom_property("after"), Some("ran"));
        assert!(world
            .events()
            .iter()
            .any(|event| event == "action.error test@<world> set_state"));
    }

    #[test]
    fn completion_callback_is_fired() {
        let mut world = World::new(EngineConfig::default());
        let parent = ActionCallback::new(RunnerId(9), 4);
        let mut runner = VerbRunner::new(
            RunnerId(2),
            VerbKey::new("child", None),
            vec![action(json!({ "type": "set_property", "prop": "x", "value": "y" }))],
            Some(parent),
        );
        runner.start(&mut world);
        assert_eq!(world.take_fired(), Some(parent));
    }

    #[test]
    fn snapshot_restores_mid_verb() {
        let mut world = World::new(EngineConfig::default());
        let mut original = runner(vec![
            action(json!({ "type": "set_property", "prop": "step", "value": "1" })),
            action(json!({ "type": "wait", "time": 1.0 })),
            action(json!({ "type": "set_property", "prop": "step", "value": "2" })),
        ]);
        original.start(&mut world);
        let snapshot = original.snapshot().expect("snapshot");
        assert_eq!(snapshot.cursor, 1);

        let mut restored = VerbRunner::restore(&snapshot).expect("restore");
        let pending = restored.pending_callback().expect("pending");
        assert_eq!(restored.resume(&mut world, pending), RunnerStatus::Finished);
        assert_eq!(world.custom_property("step"), Some("2"));
    }

    #[test]
    fn restore_rejects_cursor_past_end() {
        let mut snapshot = runner(vec![action(json!({ "type": "wait", "time": 1.0 }))])
            .snapshot()
            .expect("snapshot");
        snapshot.cursor = 4;
        assert!(matches!(
            VerbRunner::restore(&snapshot),
            Err(SnapshotError::CursorOutOfRange { cursor: 4, len: 1, .. })
        ));
    }
}
