use serde::{Deserialize, Serialize};

use super::{ActionBehavior, ActionError, CallbackLink, Step};
use crate::callback::ActionCallback;
use crate::world::{VerbRequest, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitAction {
    pub time: f32,
    #[serde(flatten)]
    pub link: CallbackLink,
}

impl ActionBehavior for WaitAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        world.start_timer(self.time, callback);
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

/// Asks the scheduler to run another verb, optionally waiting for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunVerbAction {
    pub verb: String,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(flatten)]
    pub link: CallbackLink,
}

impl ActionBehavior for RunVerbAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        world.request_verb(VerbRequest {
            verb: self.verb.clone(),
            actor: self.actor.clone(),
            callback: self.link.effect_callback(callback),
        });
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
