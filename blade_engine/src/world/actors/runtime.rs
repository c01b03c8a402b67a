use super::{ActorSnapshot, ActorStore};

/// Bundles actor state mutations with logging for runtime consumers.
pub(crate) struct ActorRuntime<'a> {
    store: &'a mut ActorStore,
    events: &'a mut Vec<String>,
}

impl<'a> ActorRuntime<'a> {
    pub(crate) fn new(store: &'a mut ActorStore, events: &'a mut Vec<String>) -> Self {
        Self { store, events }
    }

    fn log(&mut self, message: String) {
        self.events.push(message);
    }

    fn actor_mut(&mut self, id: &str) -> Option<&mut ActorSnapshot> {
        self.store.get_mut(id)
    }

    /// Switches the actor's current animation. Returns false when the actor
    /// is missing or can't animate.
    pub(crate) fn set_animation(&mut self, id: &str, animation: &str) -> bool {
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        if !actor.animated {
            return false;
        }
        actor.current_animation = Some(animation.to_string());
        self.log(format!("actor.{id}.animation {animation}"));
        true
    }

    pub(crate) fn set_state(&mut self, id: &str, state: Option<String>) -> bool {
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        let display = state.as_deref().unwrap_or("<nil>").to_string();
        actor.state = state;
        self.log(format!("actor.{id}.state {display}"));
        true
    }

    pub(crate) fn set_active(&mut self, id: &str, active: bool) -> bool {
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        actor.active = active;
        self.log(format!("actor.{id}.active {active}"));
        true
    }
}
