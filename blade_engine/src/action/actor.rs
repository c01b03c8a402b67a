use serde::{Deserialize, Serialize};

use super::{ActionBehavior, ActionError, CallbackLink, Step};
use crate::callback::ActionCallback;
use crate::tween::{Interpolation, RepeatType, TweenProperty, TweenTarget};
use crate::world::World;

fn require_actor(world: &World, id: &str) -> Result<(), ActionError> {
    match world.actor(id, false) {
        Some(_) => Ok(()),
        None => Err(ActionError::ActorNotFound(id.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationAction {
    pub actor: String,
    pub animation: String,
    #[serde(flatten)]
    pub link: CallbackLink,
}

impl ActionBehavior for AnimationAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        require_actor(world, &self.actor)?;
        if !world.start_animation(&self.actor, &self.animation, self.link.effect_callback(callback))
        {
            log::warn!(
                "actor '{}' can't play '{}', skipping",
                self.actor,
                self.animation
            );
            return Ok(Step::Complete);
        }
        if self.link.wait {
            Ok(self.link.suspend(callback))
        } else {
            Ok(Step::Complete)
        }
    }

    fn resume(
        &mut self,
        _world: &mut World,
        _callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        Ok(self.link.complete())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStateAction {
    pub actor: String,
    pub state: String,
}

impl ActionBehavior for SetStateAction {
    fn run(&mut self, world: &mut World, _callback: ActionCallback) -> Result<Step, ActionError> {
        let state = (!self.state.is_empty()).then(|| self.state.clone());
        if !world.set_actor_state(&self.actor, state) {
            return Err(ActionError::ActorNotFound(self.actor.clone()));
        }
        Ok(Step::Complete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweenAction {
    pub actor: String,
    pub property: TweenProperty,
    pub value: f32,
    pub duration: f32,
    #[serde(default)]
    pub repeat: RepeatType,
    #[serde(default = "default_count")]
    pub count: i32,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(flatten)]
    pub link: CallbackLink,
}

fn default_count() -> i32 {
    1
}

impl ActionBehavior for TweenAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        require_actor(world, &self.actor)?;

        let endless = self.repeat != RepeatType::Once && self.count < 0;
        let wait = self.link.wait && !endless;
        if self.link.wait && endless {
            log::warn!(
                "tween on '{}' repeats forever; not waiting for it",
                self.actor
            );
        }

        let started = world.start_tween(
            TweenTarget::new(self.actor.clone(), self.property),
            self.repeat,
            self.count,
            self.value,
            self.duration,
            self.interpolation,
            wait.then_some(callback),
        );
        if !started || !wait {
            return Ok(Step::Complete);
        }
        Ok(self.link.suspend(callback))
    }

    fn resume(
        &mut self,
        _world: &mut World,
        _callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        Ok(self.link.complete())
    }
}
