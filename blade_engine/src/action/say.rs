use serde::{Deserialize, Serialize};

use super::{ActionBehavior, ActionError, CallbackLink, Step};
use crate::callback::ActionCallback;
use crate::world::{TextType, World};

/// Talk variant matching the direction an animation faces.
pub fn talk_animation(previous: &str) -> &'static str {
    if previous.ends_with("left") {
        "talk.left"
    } else if previous.ends_with("right") {
        "talk.right"
    } else {
        "talk"
    }
}

/// Turns a leftover `talk.<suffix>` pose back into `stand.<suffix>`.
pub fn restore_stand_pose(world: &mut World, actor: &str) {
    let Some(current) = world
        .actor(actor, false)
        .filter(|snapshot| snapshot.animated)
        .and_then(|snapshot| snapshot.current_animation.clone())
    else {
        return;
    };
    if current.starts_with("talk.") {
        if let Some(dot) = current.find('.') {
            let stand = format!("stand{}", &current[dot..]);
            world.start_animation(actor, &stand, None);
        }
    }
}

/// Switches an animated actor into the matching talk animation and returns
/// the animation it replaced.
fn start_talking(world: &mut World, actor: &str) -> Option<String> {
    let snapshot = world.actor(actor, false).filter(|snapshot| snapshot.animated)?;
    let previous = snapshot.current_animation.clone();
    let talk = talk_animation(previous.as_deref().unwrap_or(""));
    world.start_animation(actor, talk, None);
    previous
}

/// Shows a line above an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayAction {
    pub actor: String,
    pub text: String,
    #[serde(default)]
    pub text_type: TextType,
    #[serde(flatten)]
    pub link: CallbackLink,
    #[serde(default)]
    pub previous_animation: Option<String>,
}

impl ActionBehavior for SayAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        if world.actor(&self.actor, false).is_none() {
            return Err(ActionError::ActorNotFound(self.actor.clone()));
        }
        world.show_subtitle_above(
            &self.actor,
            &self.text,
            self.text_type,
            self.link.effect_callback(callback),
        );
        if !self.link.wait {
            return Ok(Step::Complete);
        }
        self.previous_animation = match self.text_type {
            TextType::Talk => start_talking(world, &self.actor),
            TextType::Plain => None,
        };
        Ok(self.link.suspend(callback))
    }

    fn resume(
        &mut self,
        world: &mut World,
        _callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        if let Some(previous) = self.previous_animation.take() {
            world.start_animation(&self.actor, &previous, None);
        }
        Ok(self.link.complete())
    }
}

/// Says the selected option of the active dialog. The player speaks first,
/// then the dialog's actor answers; each line is one suspension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayDialogAction {
    #[serde(default)]
    pub previous_animation: Option<String>,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub character_turn: bool,
    #[serde(default)]
    pub character_name: String,
    #[serde(flatten)]
    pub link: CallbackLink,
}

impl SayDialogAction {
    fn player(world: &World) -> Result<String, ActionError> {
        let id = world
            .player_id()
            .ok_or_else(|| ActionError::ActorNotFound("<player>".to_string()))?;
        if world.actor(id, false).is_none() {
            return Err(ActionError::ActorNotFound(id.to_string()));
        }
        Ok(id.to_string())
    }

    /// Ends the player's line and starts the response, if there is one.
    fn response_phase(
        &mut self,
        world: &mut World,
        callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        self.character_turn = false;

        if let Some(previous) = self.previous_animation.take() {
            let player = Self::player(world)?;
            world.start_animation(&player, &previous, None);
        }

        let Some(text) = self.response_text.clone() else {
            return Ok(Step::Complete);
        };
        if world.actor(&self.character_name, false).is_none() {
            return Err(ActionError::ActorNotFound(self.character_name.clone()));
        }
        world.show_subtitle_above(&self.character_name, &text, TextType::Talk, Some(callback));
        self.previous_animation = start_talking(world, &self.character_name);
        Ok(Step::Suspend)
    }
}

impl ActionBehavior for SayDialogAction {
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        let dialog = world.current_dialog().ok_or(ActionError::NoActiveDialog)?;
        let option = dialog
            .current_option()
            .ok_or_else(|| ActionError::NoDialogOption(dialog.id().to_string()))?;
        let player_text = option.player_line().map(str::to_string);
        self.response_text = option.response_line().map(str::to_string);
        self.character_name = dialog.actor_id().to_string();
        self.character_turn = true;
        self.previous_animation = None;

        let player = Self::player(world)?;
        restore_stand_pose(world, &player);
        restore_stand_pose(world, &self.character_name);

        match player_text {
            Some(text) => {
                world.show_subtitle_above(&player, &text, TextType::Talk, Some(callback));
                self.previous_animation = start_talking(world, &player);
            }
            None => {
                if self.response_phase(world, callback)? == Step::Complete {
                    // nothing to say; still take one resume cycle
                    world.fire(callback);
                }
            }
        }
        Ok(self.link.suspend(callback))
    }

    fn resume(
        &mut self,
        world: &mut World,
        callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        if self.character_turn {
            return Ok(match self.response_phase(world, callback)? {
                Step::Suspend => self.link.suspend(callback),
                Step::Complete => self.link.complete(),
            });
        }

        if let Some(previous) = self.previous_animation.take() {
            world.start_animation(&self.character_name, &previous, None);
        }
        Ok(self.link.complete())
    }
}
