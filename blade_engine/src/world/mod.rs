//! Game state that actions read and mutate.
//!
//! The world is passed explicitly into every action call; nothing here is
//! process-global, so several simulations can run side by side.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

mod actors;
mod dialog;
mod text;
mod timers;

use actors::runtime::ActorRuntime;
pub use actors::{ActorSnapshot, ActorStore};
pub use dialog::{Dialog, DialogOption, DialogSession, DialogView};
pub use text::{Subtitle, TextManager, TextType};
pub use timers::{AnimationTracker, PendingAnimation, Timers};

use crate::callback::ActionCallback;
use crate::config::EngineConfig;
use crate::tween::{Interpolation, RepeatType, Tween, TweenRuntime, TweenTarget};

/// A verb another action asked to run. Handled by the scheduler after the
/// current dispatch finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbRequest {
    pub verb: String,
    #[serde(default)]
    pub actor: Option<String>,
    /// Fired once the requested verb has finished (or was refused).
    #[serde(default)]
    pub callback: Option<ActionCallback>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct World {
    #[serde(skip)]
    config: EngineConfig,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    actors: ActorStore,
    #[serde(default)]
    player: Option<String>,
    #[serde(default)]
    dialogs: BTreeMap<String, Dialog>,
    #[serde(default)]
    current_dialog: Option<DialogSession>,
    #[serde(default)]
    text: TextManager,
    #[serde(default)]
    timers: Timers,
    #[serde(default)]
    animations: AnimationTracker,
    #[serde(default)]
    tweens: TweenRuntime,
    #[serde(default)]
    fired: VecDeque<ActionCallback>,
    #[serde(default)]
    verb_requests: VecDeque<VerbRequest>,
    #[serde(default)]
    clock: f64,
    #[serde(skip)]
    events: Vec<String>,
}

impl World {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    fn actor_runtime(&mut self) -> ActorRuntime<'_> {
        ActorRuntime::new(&mut self.actors, &mut self.events)
    }

    pub fn log_event(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Seconds of game time simulated so far.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    // -- custom properties ------------------------------------------------

    pub fn custom_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_custom_property(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.log_event(format!("property.set {name} {value}"));
        self.properties.insert(name.to_string(), value);
    }

    pub fn custom_properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    // -- actors -----------------------------------------------------------

    pub fn add_actor(&mut self, actor: ActorSnapshot) {
        self.actors.insert(actor);
    }

    pub fn actor(&self, id: &str, include_inactive: bool) -> Option<&ActorSnapshot> {
        self.actors.get(id, include_inactive)
    }

    pub fn actors(&self) -> &ActorStore {
        &self.actors
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn player(&self) -> Option<&ActorSnapshot> {
        self.player
            .as_deref()
            .and_then(|id| self.actors.get(id, false))
    }

    pub fn set_player(&mut self, id: Option<String>) {
        self.player = id;
    }

    pub fn set_actor_state(&mut self, id: &str, state: Option<String>) -> bool {
        self.actor_runtime().set_state(id, state)
    }

    pub fn set_actor_active(&mut self, id: &str, active: bool) -> bool {
        if !active {
            let dropped = self.tweens.abandon_actor(id);
            if dropped > 0 {
                self.log_event(format!("tween.abandon {id} x{dropped}"));
            }
        }
        self.actor_runtime().set_active(id, active)
    }

    /// Starts an animation on an actor. With a callback, the callback fires
    /// once the animation's known length has elapsed. An animation that was
    /// being waited on and gets replaced counts as finished.
    pub fn start_animation(
        &mut self,
        actor: &str,
        animation: &str,
        callback: Option<ActionCallback>,
    ) -> bool {
        if !self.actor_runtime().set_animation(actor, animation) {
            return false;
        }
        if let Some(interrupted) = self.animations.interrupt(actor) {
            self.log_event(format!(
                "actor.{actor}.animation_interrupt {}",
                interrupted.animation
            ));
            self.fire(interrupted.callback);
        }
        if let Some(callback) = callback {
            let duration = self
                .actors
                .get(actor, true)
                .and_then(|snapshot| snapshot.animations.get(animation).copied())
                .unwrap_or(self.config.default_animation_time);
            self.animations.watch(PendingAnimation {
                actor: actor.to_string(),
                animation: animation.to_string(),
                remaining: duration,
                callback,
            });
        }
        true
    }

    // -- dialogs ----------------------------------------------------------

    pub fn add_dialog(&mut self, dialog: Dialog) {
        self.dialogs.insert(dialog.id.clone(), dialog);
    }

    pub fn start_dialog(&mut self, id: &str) -> bool {
        if !self.dialogs.contains_key(id) {
            return false;
        }
        self.current_dialog = Some(DialogSession {
            dialog: id.to_string(),
            current_option: None,
        });
        self.log_event(format!("dialog.start {id}"));
        true
    }

    pub fn end_dialog(&mut self) {
        if let Some(session) = self.current_dialog.take() {
            self.log_event(format!("dialog.end {}", session.dialog));
        }
    }

    pub fn current_dialog(&self) -> Option<DialogView<'_>> {
        let session = self.current_dialog.as_ref()?;
        let dialog = self.dialogs.get(&session.dialog)?;
        Some(DialogView::new(dialog, session))
    }

    /// Marks an option as the player's choice and returns it.
    pub fn select_dialog_option(&mut self, index: usize) -> Option<DialogOption> {
        let session = self.current_dialog.as_mut()?;
        let option = self
            .dialogs
            .get(&session.dialog)?
            .options
            .get(index)
            .filter(|option| option.visible)?
            .clone();
        session.current_option = Some(index);
        let dialog = session.dialog.clone();
        self.log_event(format!("dialog.{dialog}.select {index}"));
        Some(option)
    }

    // -- effects ----------------------------------------------------------

    pub fn show_subtitle(
        &mut self,
        text: &str,
        position: (f32, f32),
        kind: TextType,
        speaker: Option<&str>,
        callback: Option<ActionCallback>,
    ) {
        let duration = self.config.subtitle_duration(text);
        self.log_event(format!(
            "text.subtitle {} {text}",
            speaker.unwrap_or("<none>")
        ));
        self.text.add_subtitle(Subtitle {
            text: text.to_string(),
            x: position.0,
            y: position.1,
            kind,
            speaker: speaker.map(str::to_string),
            duration,
            callback,
        });
    }

    /// Subtitle anchored above an actor. Returns false when the actor is
    /// missing.
    pub fn show_subtitle_above(
        &mut self,
        actor: &str,
        text: &str,
        kind: TextType,
        callback: Option<ActionCallback>,
    ) -> bool {
        let Some(position) = self
            .actors
            .get(actor, true)
            .map(ActorSnapshot::subtitle_anchor)
        else {
            return false;
        };
        self.show_subtitle(text, position, kind, Some(actor), callback);
        true
    }

    pub fn current_subtitle(&self) -> Option<&Subtitle> {
        self.text.current()
    }

    /// Ends the subtitle on screen, firing its callback.
    pub fn skip_subtitle(&mut self) -> bool {
        match self.text.skip() {
            Some(subtitle) => {
                self.finish_subtitle(subtitle);
                true
            }
            None => false,
        }
    }

    pub fn start_timer(&mut self, seconds: f32, callback: ActionCallback) {
        self.log_event(format!("timer.start {seconds:.3}"));
        self.timers.start(seconds, callback);
    }

    /// Starts a tween on an actor property. Returns false when the target
    /// can't be read. A tween already running on the same target is
    /// replaced and its callback fired.
    #[allow(clippy::too_many_arguments)]
    pub fn start_tween(
        &mut self,
        target: TweenTarget,
        repeat: RepeatType,
        count: i32,
        value: f32,
        duration: f32,
        interpolation: Interpolation,
        callback: Option<ActionCallback>,
    ) -> bool {
        let Some(tween) = Tween::start(
            &self.actors,
            target.clone(),
            repeat,
            count,
            value,
            duration,
            interpolation,
            callback,
        ) else {
            return false;
        };
        self.log_event(format!("tween.start {target} {value:.3}"));
        if let Some(replaced) = self.tweens.insert(tween) {
            self.log_event(format!("tween.replace {target}"));
            if let Some(callback) = replaced.callback() {
                self.fire(callback);
            }
        }
        true
    }

    pub fn tweens(&self) -> &TweenRuntime {
        &self.tweens
    }

    pub fn request_verb(&mut self, request: VerbRequest) {
        self.log_event(format!(
            "verb.request {} {}",
            request.verb,
            request.actor.as_deref().unwrap_or("<world>")
        ));
        self.verb_requests.push_back(request);
    }

    pub(crate) fn take_verb_request(&mut self) -> Option<VerbRequest> {
        self.verb_requests.pop_front()
    }

    /// Queues a callback for dispatch on the scheduler's next pass.
    pub fn fire(&mut self, callback: ActionCallback) {
        self.fired.push_back(callback);
    }

    pub(crate) fn take_fired(&mut self) -> Option<ActionCallback> {
        self.fired.pop_front()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.fired.len()
    }

    /// Advances every running effect by `dt` seconds and queues the
    /// callbacks of the ones that finished.
    pub fn update(&mut self, dt: f32) {
        self.clock += f64::from(dt);

        for subtitle in self.text.update(dt) {
            self.finish_subtitle(subtitle);
        }

        for callback in self.timers.update(dt) {
            self.log_event("timer.end");
            self.fire(callback);
        }

        for done in self.animations.update(dt) {
            self.log_event(format!("actor.{}.animation_end {}", done.actor, done.animation));
            self.fire(done.callback);
        }

        for (target, callback) in self.tweens.update(&mut self.actors, dt) {
            self.log_event(format!("tween.end {target}"));
            if let Some(callback) = callback {
                self.fire(callback);
            }
        }
    }

    fn finish_subtitle(&mut self, subtitle: Subtitle) {
        self.log_event(format!(
            "text.end {}",
            subtitle.speaker.as_deref().unwrap_or("<none>")
        ));
        if let Some(callback) = subtitle.callback {
            self.fire(callback);
        }
    }

    /// Drops every running effect and queued callback without firing
    /// anything. Used when all runners are discarded at once.
    pub fn abandon_effects(&mut self) {
        self.text.clear();
        self.timers = Timers::new();
        self.animations = AnimationTracker::new();
        self.tweens = TweenRuntime::new();
        self.fired.clear();
        self.verb_requests.clear();
        self.log_event("world.abandon_effects");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RunnerId;
    use crate::tween::TweenProperty;

    fn cb(ticket: u32) -> ActionCallback {
        ActionCallback::new(RunnerId(1), ticket)
    }

    fn world_with_bob() -> World {
        let mut world = World::new(EngineConfig::default());
        let mut bob = ActorSnapshot::new("bob");
        bob.height = 2.0;
        bob.x = 3.0;
        bob.animations.insert("wave".into(), 0.5);
        world.add_actor(bob);
        world
    }

    #[test]
    fn subtitle_anchor_sits_above_actor() {
        let mut world = world_with_bob();
        assert!(world.show_subtitle_above("bob", "Hey", TextType::Talk, Some(cb(1))));
        let subtitle = world.current_subtitle().expect("subtitle shown");
        assert_eq!((subtitle.x, subtitle.y), (3.0, 2.0));
        assert!(!world.show_subtitle_above("nobody", "Hey", TextType::Talk, None));

        world.update(1.5);
        assert_eq!(world.take_fired(), Some(cb(1)));
        assert_eq!(world.take_fired(), None);
    }

    #[test]
    fn animation_completion_fires_after_known_length() {
        let mut world = world_with_bob();
        assert!(world.start_animation("bob", "wave", Some(cb(2))));
        world.update(0.25);
        assert_eq!(world.pending_callbacks(), 0);
        world.update(0.25);
        assert_eq!(world.take_fired(), Some(cb(2)));
        assert!(world
            .events()
            .iter()
            .any(|event| event == "actor.bob.animation wave"));
    }

    #[test]
    fn replacing_a_waited_animation_fires_its_callback() {
        let mut world = world_with_bob();
        world.start_animation("bob", "wave", Some(cb(3)));
        world.start_animation("bob", "stand", None);
        assert_eq!(world.take_fired(), Some(cb(3)));
    }

    #[test]
    fn tween_writes_back_into_actor() {
        let mut world = world_with_bob();
        assert!(world.start_tween(
            TweenTarget::new("bob", TweenProperty::X),
            RepeatType::Once,
            1,
            5.0,
            1.0,
            Interpolation::Linear,
            Some(cb(4)),
        ));
        world.update(0.5);
        assert_eq!(world.actor("bob", false).map(|a| a.x), Some(4.0));
        world.update(0.5);
        assert_eq!(world.actor("bob", false).map(|a| a.x), Some(5.0));
        assert_eq!(world.take_fired(), Some(cb(4)));
    }

    #[test]
    fn deactivating_actor_abandons_its_tweens() {
        let mut world = world_with_bob();
        world.set_player(Some("bob".into()));
        assert_eq!(world.player().map(|actor| actor.id.as_str()), Some("bob"));
        world.start_tween(
            TweenTarget::new("bob", TweenProperty::X),
            RepeatType::Once,
            1,
            5.0,
            1.0,
            Interpolation::Linear,
            Some(cb(5)),
        );
        assert!(world.set_actor_active("bob", false));
        assert!(world.tweens().is_empty());
        assert!(world.player().is_none(), "inactive player is hidden");
        assert_eq!(world.actors().len(), 1);

        world.update(1.0);
        assert_eq!(world.take_fired(), None);
        assert!(world
            .events()
            .iter()
            .any(|event| event == "tween.abandon bob x1"));
    }

    #[test]
    fn dialog_selection_tracks_option() {
        let mut world = world_with_bob();
        world.add_dialog(Dialog {
            id: "chat".into(),
            actor: "bob".into(),
            options: vec![DialogOption::new(Some("Hi"), Some("Hello"))],
        });
        assert!(world.select_dialog_option(0).is_none(), "no dialog running");
        assert!(world.start_dialog("chat"));
        let option = world.select_dialog_option(0).expect("option exists");
        assert_eq!(option.response_line(), Some("Hello"));
        let view = world.current_dialog().expect("dialog active");
        assert_eq!(view.actor_id(), "bob");
        assert_eq!(view.current_option().and_then(|o| o.player_line()), Some("Hi"));
        world.end_dialog();
        assert!(world.current_dialog().is_none());
    }
}
