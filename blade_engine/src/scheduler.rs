use std::collections::BTreeMap;

use crate::action::Action;
use crate::callback::{ActionCallback, RunnerId};
use crate::config::EngineConfig;
use crate::runner::{RunnerStatus, VerbRunner};
use crate::snapshot::{LoadReport, SaveGame, SnapshotError};
use crate::verb::{VerbError, VerbKey, VerbManager};
use crate::world::{VerbRequest, World};

/// Upper bound on callbacks and verb requests handled in one dispatch.
/// Anything left over waits for the next frame.
const MAX_DISPATCH: usize = 1024;

/// Owns the world, the verb catalog and every live runner. Drives them one
/// frame at a time.
#[derive(Debug)]
pub struct VerbScheduler {
    world: World,
    verbs: VerbManager,
    runners: BTreeMap<RunnerId, VerbRunner>,
    next_runner: u32,
}

impl VerbScheduler {
    pub fn new(world: World, verbs: VerbManager) -> Self {
        Self {
            world,
            verbs,
            runners: BTreeMap::new(),
            next_runner: 1,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn verbs(&self) -> &VerbManager {
        &self.verbs
    }

    pub fn runners(&self) -> impl Iterator<Item = &VerbRunner> {
        self.runners.values()
    }

    pub fn is_busy(&self, key: &VerbKey) -> bool {
        self.runners.values().any(|runner| runner.key() == key)
    }

    /// No runner is waiting and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.runners.is_empty() && self.world.pending_callbacks() == 0
    }

    /// Starts a verb in the scope of `actor` (or the world). Actions run
    /// synchronously until the first suspension.
    pub fn trigger(
        &mut self,
        verb: &str,
        actor: Option<&str>,
        target: Option<&str>,
    ) -> Result<RunnerId, VerbError> {
        self.trigger_with(verb, actor, target, None)
    }

    fn trigger_with(
        &mut self,
        verb: &str,
        actor: Option<&str>,
        target: Option<&str>,
        on_complete: Option<ActionCallback>,
    ) -> Result<RunnerId, VerbError> {
        let (key, actions) = self.prepare(verb, actor, target)?;
        Ok(self.spawn(key, actions, on_complete))
    }

    /// Resolves a verb for a scope without touching any state.
    fn prepare(
        &self,
        verb: &str,
        actor: Option<&str>,
        target: Option<&str>,
    ) -> Result<(VerbKey, Vec<Action>), VerbError> {
        let key = VerbKey::new(verb, actor);
        if self.is_busy(&key) {
            return Err(VerbError::Busy(key));
        }

        let state = match actor {
            Some(id) => self
                .world
                .actor(id, false)
                .ok_or_else(|| VerbError::UnknownActor(id.to_string()))?
                .state
                .clone(),
            None => None,
        };
        let actions = self
            .verbs
            .lookup(verb, actor, state.as_deref(), target)?
            .actions
            .clone();
        Ok((key, actions))
    }

    fn spawn(
        &mut self,
        key: VerbKey,
        actions: Vec<Action>,
        on_complete: Option<ActionCallback>,
    ) -> RunnerId {
        let id = RunnerId(self.next_runner);
        self.next_runner += 1;
        self.world.log_event(format!("verb.start {key}"));

        let mut runner = VerbRunner::new(id, key, actions, on_complete);
        if runner.start(&mut self.world) == RunnerStatus::Waiting {
            self.runners.insert(id, runner);
        }
        id
    }

    /// Picks a dialog option and runs its verb in the responder's scope.
    /// The selection only moves once the option's verb is known to start.
    pub fn select_dialog_option(&mut self, index: usize) -> Result<Option<RunnerId>, VerbError> {
        let (verb, responder) = {
            let dialog = self
                .world
                .current_dialog()
                .ok_or(VerbError::NoDialogOption(index))?;
            let option = dialog
                .option(index)
                .ok_or(VerbError::NoDialogOption(index))?;
            (option.verb.clone(), dialog.actor_id().to_string())
        };
        let prepared = verb
            .as_deref()
            .map(|verb| self.prepare(verb, Some(responder.as_str()), None))
            .transpose()?;

        self.world
            .select_dialog_option(index)
            .ok_or(VerbError::NoDialogOption(index))?;
        Ok(prepared.map(|(key, actions)| self.spawn(key, actions, None)))
    }

    /// Advances every effect by `dt` and resumes the runners whose effects
    /// finished.
    pub fn update(&mut self, dt: f32) {
        self.world.update(dt);
        self.dispatch();
    }

    /// Delivers queued callbacks and starts requested verbs until both
    /// queues are empty.
    pub fn dispatch(&mut self) {
        for _ in 0..MAX_DISPATCH {
            if let Some(request) = self.world.take_verb_request() {
                self.handle_request(request);
            } else if let Some(callback) = self.world.take_fired() {
                self.deliver(callback);
            } else {
                return;
            }
        }
        log::warn!("dispatch limit reached; remaining work deferred to the next frame");
    }

    fn handle_request(&mut self, request: VerbRequest) {
        let VerbRequest {
            verb,
            actor,
            callback,
        } = request;
        if let Err(err) = self.trigger_with(&verb, actor.as_deref(), None, callback) {
            log::warn!("nested verb '{verb}' refused: {err}");
            self.world.log_event(format!("verb.refused {verb}"));
            if let Some(callback) = callback {
                self.world.fire(callback);
            }
        }
    }

    fn deliver(&mut self, callback: ActionCallback) {
        let Some(mut runner) = self.runners.remove(&callback.runner) else {
            log::warn!("callback {callback} for a runner that no longer exists");
            return;
        };
        match runner.resume(&mut self.world, callback) {
            RunnerStatus::Waiting | RunnerStatus::Stale => {
                self.runners.insert(runner.id(), runner);
            }
            RunnerStatus::Finished => {}
        }
    }

    /// Discards the runner bound to `key`. Its outstanding callback becomes
    /// stale; effects it started keep running. A parent waiting on the
    /// runner through `run_verb` is released.
    pub fn abort(&mut self, key: &VerbKey) -> bool {
        let Some(id) = self
            .runners
            .values()
            .find(|runner| runner.key() == key)
            .map(VerbRunner::id)
        else {
            return false;
        };
        let Some(runner) = self.runners.remove(&id) else {
            return false;
        };
        self.world.log_event(format!("verb.abort {key}"));
        if let Some(callback) = runner.on_complete() {
            self.world.fire(callback);
        }
        true
    }

    /// Drops every runner and every running effect, e.g. on scene change.
    pub fn abort_all(&mut self) {
        self.runners.clear();
        self.world.abandon_effects();
    }

    pub fn save(&self) -> Result<SaveGame, SnapshotError> {
        let runners = self
            .runners
            .values()
            .map(VerbRunner::snapshot)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SaveGame {
            world: self.world.clone(),
            runners,
            next_runner: self.next_runner,
        })
    }

    /// Rebuilds a scheduler from a save. A runner that can't be restored is
    /// reported and dropped; if something was waiting on it, that caller is
    /// released.
    pub fn load(save: SaveGame, verbs: VerbManager, config: EngineConfig) -> (Self, LoadReport) {
        let SaveGame {
            mut world,
            runners: snapshots,
            next_runner,
        } = save;
        world.set_config(config);

        let mut report = LoadReport::default();
        let mut runners = BTreeMap::new();
        let mut next = next_runner;
        for snapshot in &snapshots {
            next = next.max(snapshot.id.0.saturating_add(1));
            match VerbRunner::restore(snapshot) {
                Ok(runner) => {
                    report.restored.push(runner.id());
                    runners.insert(runner.id(), runner);
                }
                Err(err) => {
                    log::warn!("dropping runner {} ({}): {err}", snapshot.id, snapshot.key);
                    world.log_event(format!("load.drop {}", snapshot.key));
                    if let Some(callback) = snapshot.on_complete {
                        world.fire(callback);
                    }
                    report.failed.push((snapshot.id, err));
                }
            }
        }

        let scheduler = Self {
            world,
            verbs,
            runners,
            next_runner: next,
        };
        (scheduler, report)
    }
}
