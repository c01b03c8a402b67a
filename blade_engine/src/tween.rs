//! Time based interpolation of actor properties.
//!
//! A tween never owns what it animates. It holds a [`TweenTarget`] (actor id
//! plus property) and goes through a [`TweenHost`] each frame to read or
//! write the value, so the actor can disappear without the tween dangling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::callback::ActionCallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatType {
    #[default]
    Once,
    Repeat,
    Yoyo,
}

impl RepeatType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "once" | "no_repeat" => Some(Self::Once),
            "repeat" => Some(Self::Repeat),
            "yoyo" => Some(Self::Yoyo),
            _ => None,
        }
    }
}

/// Easing curves. Every curve maps 0 to 0 and 1 to 1 and is monotonic in
/// between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    Smooth,
    Fade,
    Pow2,
    Pow2In,
    Pow2Out,
    Pow3,
    Pow3In,
    Pow3Out,
    Sine,
    SineIn,
    SineOut,
    CircleIn,
    CircleOut,
}

impl Interpolation {
    pub fn apply(self, t: f32) -> f32 {
        use std::f32::consts::PI;

        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Interpolation::Linear => t,
            Interpolation::Smooth => t * t * (3.0 - 2.0 * t),
            Interpolation::Fade => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
            Interpolation::Pow2 => pow_in_out(t, 2),
            Interpolation::Pow2In => t.powi(2),
            Interpolation::Pow2Out => 1.0 - (1.0 - t).powi(2),
            Interpolation::Pow3 => pow_in_out(t, 3),
            Interpolation::Pow3In => t.powi(3),
            Interpolation::Pow3Out => 1.0 - (1.0 - t).powi(3),
            Interpolation::Sine => (1.0 - (t * PI).cos()) / 2.0,
            Interpolation::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Interpolation::SineOut => (t * PI / 2.0).sin(),
            Interpolation::CircleIn => 1.0 - (1.0 - t * t).sqrt(),
            Interpolation::CircleOut => (1.0 - (t - 1.0) * (t - 1.0)).sqrt(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
    }
}

fn pow_in_out(t: f32, power: i32) -> f32 {
    if t <= 0.5 {
        (t * 2.0).powi(power) / 2.0
    } else {
        let sign = if power % 2 == 0 { -1.0 } else { 1.0 };
        sign * ((t - 1.0) * 2.0).powi(power) / 2.0 + 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenProperty {
    X,
    Y,
    Scale,
    Rotation,
    Alpha,
}

impl TweenProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            TweenProperty::X => "x",
            TweenProperty::Y => "y",
            TweenProperty::Scale => "scale",
            TweenProperty::Rotation => "rotation",
            TweenProperty::Alpha => "alpha",
        }
    }
}

/// Non-owning reference to the animated value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TweenTarget {
    pub actor: String,
    pub property: TweenProperty,
}

impl TweenTarget {
    pub fn new(actor: impl Into<String>, property: TweenProperty) -> Self {
        Self {
            actor: actor.into(),
            property,
        }
    }
}

impl fmt::Display for TweenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.actor, self.property.as_str())
    }
}

/// Storage the tween reads its start value from and writes progress into.
pub trait TweenHost {
    fn tween_value(&self, target: &TweenTarget) -> Option<f32>;

    /// Returns false when the target no longer exists.
    fn set_tween_value(&mut self, target: &TweenTarget, value: f32) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenStep {
    Running,
    Finished { callback: Option<ActionCallback> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tween {
    target: TweenTarget,
    start_value: f32,
    target_value: f32,
    duration: f32,
    elapsed: f32,
    /// Eased progress within the current leg, from `start_value` toward
    /// `target_value`.
    progress: f32,
    repeat: RepeatType,
    /// Remaining cycles, counting the current one. Negative repeats forever.
    count: i32,
    interpolation: Interpolation,
    reverse: bool,
    #[serde(default)]
    callback: Option<ActionCallback>,
    complete: bool,
}

impl Tween {
    /// Captures the start value from the host. Returns `None` when the
    /// target can't be read.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        host: &impl TweenHost,
        target: TweenTarget,
        repeat: RepeatType,
        count: i32,
        target_value: f32,
        duration: f32,
        interpolation: Interpolation,
        callback: Option<ActionCallback>,
    ) -> Option<Self> {
        let start_value = host.tween_value(&target)?;
        Some(Self {
            target,
            start_value,
            target_value,
            duration,
            elapsed: 0.0,
            progress: 0.0,
            repeat,
            count,
            interpolation,
            reverse: false,
            callback,
            complete: false,
        })
    }

    pub fn target(&self) -> &TweenTarget {
        &self.target
    }

    /// Progress measured along the first leg: a yoyo's return trip runs
    /// from 1 back to 0.
    pub fn percent(&self) -> f32 {
        if self.reverse {
            1.0 - self.progress
        } else {
            self.progress
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn callback(&self) -> Option<ActionCallback> {
        self.callback
    }

    /// Current interpolated value.
    pub fn value(&self) -> f32 {
        self.start_value + self.progress * (self.target_value - self.start_value)
    }

    pub fn update(&mut self, host: &mut impl TweenHost, dt: f32) -> TweenStep {
        if self.complete {
            return TweenStep::Finished { callback: None };
        }

        self.elapsed += dt;
        let raw = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };
        self.progress = self.interpolation.apply(raw);

        if !host.set_tween_value(&self.target, self.value()) {
            log::debug!("tween target {} vanished; dropping tween", self.target);
            self.complete = true;
            return TweenStep::Finished {
                callback: self.callback.take(),
            };
        }

        if raw < 1.0 {
            return TweenStep::Running;
        }

        match self.repeat {
            RepeatType::Once => self.finish(),
            RepeatType::Repeat | RepeatType::Yoyo => {
                if self.count >= 0 {
                    self.count -= 1;
                    if self.count <= 0 {
                        return self.finish();
                    }
                }
                self.elapsed = 0.0;
                if self.repeat == RepeatType::Yoyo {
                    std::mem::swap(&mut self.start_value, &mut self.target_value);
                    self.reverse = !self.reverse;
                    self.progress = 0.0;
                }
                TweenStep::Running
            }
        }
    }

    fn finish(&mut self) -> TweenStep {
        self.complete = true;
        TweenStep::Finished {
            callback: self.callback.take(),
        }
    }
}

/// Live tweens, at most one per target.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TweenRuntime {
    tweens: Vec<Tween>,
}

impl TweenRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tween, replacing any older tween on the same target. The
    /// replaced tween is handed back so the caller can settle its callback.
    pub fn insert(&mut self, tween: Tween) -> Option<Tween> {
        let replaced = self
            .tweens
            .iter()
            .position(|existing| existing.target == tween.target)
            .map(|index| self.tweens.remove(index));
        self.tweens.push(tween);
        replaced
    }

    pub fn get(&self, target: &TweenTarget) -> Option<&Tween> {
        self.tweens.iter().find(|tween| &tween.target == target)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Drops every tween on an actor without firing callbacks.
    pub fn abandon_actor(&mut self, actor: &str) -> usize {
        let before = self.tweens.len();
        self.tweens.retain(|tween| tween.target.actor != actor);
        before - self.tweens.len()
    }

    /// Steps every tween and returns the targets that finished together with
    /// the callbacks they fired.
    pub fn update(
        &mut self,
        host: &mut impl TweenHost,
        dt: f32,
    ) -> Vec<(TweenTarget, Option<ActionCallback>)> {
        let mut finished = Vec::new();
        for tween in &mut self.tweens {
            if let TweenStep::Finished { callback } = tween.update(host, dt) {
                finished.push((tween.target.clone(), callback));
            }
        }
        self.tweens.retain(|tween| !tween.complete);
        finished
    }
}
