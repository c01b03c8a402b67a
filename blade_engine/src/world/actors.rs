use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tween::{TweenHost, TweenProperty, TweenTarget};

pub(crate) mod runtime;

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

/// Everything the runtime tracks about an actor. Rendering lives elsewhere;
/// this is only the state actions read and mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default = "default_one")]
    pub scale: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_one")]
    pub alpha: f32,
    #[serde(default)]
    pub state: Option<String>,
    /// Sprite actors can play animations; plain hotspots can't.
    #[serde(default = "default_true")]
    pub animated: bool,
    #[serde(default, rename = "animation")]
    pub current_animation: Option<String>,
    /// Known animation lengths in seconds.
    #[serde(default)]
    pub animations: BTreeMap<String, f32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl ActorSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            state: None,
            animated: true,
            current_animation: None,
            animations: BTreeMap::new(),
            active: true,
        }
    }

    /// Anchor point for subtitles: centred over the actor's head.
    pub fn subtitle_anchor(&self) -> (f32, f32) {
        (self.x, self.y + self.height * self.scale)
    }

    fn property(&self, property: TweenProperty) -> f32 {
        match property {
            TweenProperty::X => self.x,
            TweenProperty::Y => self.y,
            TweenProperty::Scale => self.scale,
            TweenProperty::Rotation => self.rotation,
            TweenProperty::Alpha => self.alpha,
        }
    }

    fn property_mut(&mut self, property: TweenProperty) -> &mut f32 {
        match property {
            TweenProperty::X => &mut self.x,
            TweenProperty::Y => &mut self.y,
            TweenProperty::Scale => &mut self.scale,
            TweenProperty::Rotation => &mut self.rotation,
            TweenProperty::Alpha => &mut self.alpha,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorStore {
    actors: BTreeMap<String, ActorSnapshot>,
}

impl ActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: ActorSnapshot) -> Option<ActorSnapshot> {
        self.actors.insert(actor.id.clone(), actor)
    }

    /// Looks an actor up; inactive actors are only returned when asked for.
    pub fn get(&self, id: &str, include_inactive: bool) -> Option<&ActorSnapshot> {
        self.actors
            .get(id)
            .filter(|actor| include_inactive || actor.active)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ActorSnapshot> {
        self.actors.get_mut(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl TweenHost for ActorStore {
    fn tween_value(&self, target: &TweenTarget) -> Option<f32> {
        self.actors
            .get(&target.actor)
            .map(|actor| actor.property(target.property))
    }

    fn set_tween_value(&mut self, target: &TweenTarget, value: f32) -> bool {
        match self.actors.get_mut(&target.actor) {
            Some(actor) => {
                *actor.property_mut(target.property) = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_actors_hidden_by_default() {
        let mut store = ActorStore::new();
        let mut ghost = ActorSnapshot::new("ghost");
        ghost.active = false;
        store.insert(ghost);
        assert!(store.get("ghost", false).is_none());
        assert!(store.get("ghost", true).is_some());
    }

    #[test]
    fn tween_host_reads_and_writes_properties() {
        let mut store = ActorStore::new();
        store.insert(ActorSnapshot::new("door"));
        let target = TweenTarget::new("door", TweenProperty::Scale);
        assert_eq!(store.tween_value(&target), Some(1.0));
        assert!(store.set_tween_value(&target, 2.5));
        assert_eq!(store.get("door", false).map(|actor| actor.scale), Some(2.5));
        assert!(!store.set_tween_value(&TweenTarget::new("nobody", TweenProperty::X), 1.0));
    }

    #[test]
    fn story_json_fills_defaults() {
        let actor: ActorSnapshot =
            serde_json::from_str(r#"{ "id": "bob", "animation": "stand.left" }"#)
                .expect("parse actor");
        assert!(actor.animated);
        assert!(actor.active);
        assert_eq!(actor.scale, 1.0);
        assert_eq!(actor.current_animation.as_deref(), Some("stand.left"));
    }
}
