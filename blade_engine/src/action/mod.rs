//! Scripted steps that make up a verb.
//!
//! Every kind of step is a variant of the closed [`Action`] enum. Kinds are
//! named by a stable tag ([`ActionKind::tag`]) which is what story files and
//! snapshots use; [`ActionKind::from_tag`] is the only way back from a tag to
//! a constructor.
//!
//! A step either finishes inside [`Action::run`] or returns
//! [`Step::Suspend`] after handing its [`ActionCallback`] to some effect in
//! the [`World`]. When the effect finishes the runner calls
//! [`Action::resume`], which may finish or suspend again for another phase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

mod actor;
mod control;
mod properties;
mod say;

pub use actor::{AnimationAction, SetStateAction, TweenAction};
pub use control::{RunVerbAction, WaitAction};
pub use properties::{AddValueToPropertyAction, SetPropertyAction};
pub use say::{restore_stand_pose, talk_animation, SayAction, SayDialogAction};

use crate::callback::ActionCallback;
use crate::snapshot::{ActionSnapshot, SnapshotError};
use crate::world::World;

/// Result of running or resuming a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Complete,
    Suspend,
}

impl Step {
    pub fn is_suspended(self) -> bool {
        self == Step::Suspend
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("actor '{0}' not found")]
    ActorNotFound(String),
    #[error("no dialog is active")]
    NoActiveDialog,
    #[error("dialog '{0}' has no selected option")]
    NoDialogOption(String),
    #[error("unknown action type '{0}'")]
    UnknownType(String),
    #[error("action definition must be an object with a \"type\" tag")]
    NotAnObject,
    #[error("{kind} is missing required property '{property}'")]
    MissingProperty {
        kind: &'static str,
        property: &'static str,
    },
    #[error("{kind}.{property} expects {expected}")]
    PropertyType {
        kind: &'static str,
        property: &'static str,
        expected: &'static str,
    },
    #[error("invalid {kind} definition: {source}")]
    Definition {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Value type of an action property, used to validate story files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    ActorId,
    Enum(&'static [&'static str]),
}

impl PropertyType {
    fn describe(self) -> &'static str {
        match self {
            PropertyType::String => "a string",
            PropertyType::Number => "a number",
            PropertyType::Integer => "an integer",
            PropertyType::Boolean => "a boolean",
            PropertyType::ActorId => "an actor id",
            PropertyType::Enum(_) => "one of the listed names",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            PropertyType::String | PropertyType::ActorId => value.is_string(),
            PropertyType::Number => value.is_number(),
            PropertyType::Integer => value.is_i64(),
            PropertyType::Boolean => value.is_boolean(),
            PropertyType::Enum(names) => value
                .as_str()
                .map(|name| names.contains(&name))
                .unwrap_or(false),
        }
    }

    fn default_value(self, raw: &str) -> Value {
        match self {
            PropertyType::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PropertyType::Integer => raw.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            PropertyType::Boolean => Value::Bool(raw == "true"),
            PropertyType::String | PropertyType::ActorId | PropertyType::Enum(_) => {
                Value::String(raw.to_string())
            }
        }
    }
}

/// Declares one authored field of an action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionProperty {
    pub name: &'static str,
    pub kind: PropertyType,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

const fn required(
    name: &'static str,
    kind: PropertyType,
    description: &'static str,
) -> ActionProperty {
    ActionProperty {
        name,
        kind,
        required: true,
        default: None,
        description,
    }
}

const fn optional(
    name: &'static str,
    kind: PropertyType,
    default: Option<&'static str>,
    description: &'static str,
) -> ActionProperty {
    ActionProperty {
        name,
        kind,
        required: false,
        default,
        description,
    }
}

const WAIT: ActionProperty = optional(
    "wait",
    PropertyType::Boolean,
    Some("true"),
    "If true, the verb waits for the effect to finish.",
);

const REPEAT_NAMES: &[&str] = &["once", "repeat", "yoyo"];
const INTERPOLATION_NAMES: &[&str] = &[
    "linear",
    "smooth",
    "fade",
    "pow2",
    "pow2_in",
    "pow2_out",
    "pow3",
    "pow3_in",
    "pow3_out",
    "sine",
    "sine_in",
    "sine_out",
    "circle_in",
    "circle_out",
];
const PROPERTY_NAMES: &[&str] = &["x", "y", "scale", "rotation", "alpha"];
const TEXT_TYPES: &[&str] = &["talk", "plain"];

const SET_PROPERTY: &[ActionProperty] = &[
    required("prop", PropertyType::String, "Property name"),
    required("value", PropertyType::String, "Property value"),
];

const ADD_VALUE_TO_PROPERTY: &[ActionProperty] = &[
    required("prop", PropertyType::String, "Property name"),
    required("value", PropertyType::Number, "The integer value to add."),
];

const SAY: &[ActionProperty] = &[
    required("actor", PropertyType::ActorId, "Actor speaking the line"),
    required("text", PropertyType::String, "Line to show"),
    optional(
        "textType",
        PropertyType::Enum(TEXT_TYPES),
        Some("talk"),
        "talk lines switch the actor to a talk animation",
    ),
    WAIT,
];

const ANIMATION: &[ActionProperty] = &[
    required("actor", PropertyType::ActorId, "Target actor"),
    required("animation", PropertyType::String, "Animation id"),
    optional(
        "wait",
        PropertyType::Boolean,
        Some("false"),
        "If true, the verb waits for the animation to end.",
    ),
];

const SET_STATE: &[ActionProperty] = &[
    required("actor", PropertyType::ActorId, "Target actor"),
    required("state", PropertyType::String, "New state; empty clears it"),
];

const TWEEN: &[ActionProperty] = &[
    required("actor", PropertyType::ActorId, "Target actor"),
    required(
        "property",
        PropertyType::Enum(PROPERTY_NAMES),
        "Property to animate",
    ),
    required("value", PropertyType::Number, "Final value"),
    optional(
        "duration",
        PropertyType::Number,
        Some("1.0"),
        "Seconds per cycle",
    ),
    optional(
        "repeat",
        PropertyType::Enum(REPEAT_NAMES),
        Some("once"),
        "Repeat policy",
    ),
    optional(
        "count",
        PropertyType::Integer,
        Some("1"),
        "Cycles for repeat/yoyo; negative repeats forever",
    ),
    optional(
        "interpolation",
        PropertyType::Enum(INTERPOLATION_NAMES),
        Some("linear"),
        "Easing curve",
    ),
    WAIT,
];

const WAIT_TIME: &[ActionProperty] = &[required("time", PropertyType::Number, "Seconds to wait")];

const RUN_VERB: &[ActionProperty] = &[
    required("verb", PropertyType::String, "Verb id"),
    optional(
        "actor",
        PropertyType::ActorId,
        None,
        "Actor scope; world verbs when absent",
    ),
    WAIT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SetProperty,
    AddValueToProperty,
    SayDialog,
    Say,
    Animation,
    SetState,
    Tween,
    Wait,
    RunVerb,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::SetProperty,
        ActionKind::AddValueToProperty,
        ActionKind::SayDialog,
        ActionKind::Say,
        ActionKind::Animation,
        ActionKind::SetState,
        ActionKind::Tween,
        ActionKind::Wait,
        ActionKind::RunVerb,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::SetProperty => "set_property",
            ActionKind::AddValueToProperty => "add_value_to_property",
            ActionKind::SayDialog => "say_dialog",
            ActionKind::Say => "say",
            ActionKind::Animation => "animation",
            ActionKind::SetState => "set_state",
            ActionKind::Tween => "tween",
            ActionKind::Wait => "wait",
            ActionKind::RunVerb => "run_verb",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionKind::SetProperty => "Sets a custom world property.",
            ActionKind::AddValueToProperty => "Adds an integer value to the selected property.",
            ActionKind::SayDialog => {
                "Says the selected option of the current dialog: the player line, then the response."
            }
            ActionKind::Say => "Shows a line of text above an actor.",
            ActionKind::Animation => "Starts an actor animation.",
            ActionKind::SetState => "Changes an actor's state.",
            ActionKind::Tween => "Interpolates an actor property over time.",
            ActionKind::Wait => "Pauses the verb for a number of seconds.",
            ActionKind::RunVerb => "Runs another verb.",
        }
    }

    pub fn properties(self) -> &'static [ActionProperty] {
        match self {
            ActionKind::SetProperty => SET_PROPERTY,
            ActionKind::AddValueToProperty => ADD_VALUE_TO_PROPERTY,
            ActionKind::SayDialog => &[],
            ActionKind::Say => SAY,
            ActionKind::Animation => ANIMATION,
            ActionKind::SetState => SET_STATE,
            ActionKind::Tween => TWEEN,
            ActionKind::Wait => WAIT_TIME,
            ActionKind::RunVerb => RUN_VERB,
        }
    }

    fn construct(self, fields: Value) -> Result<Action, serde_json::Error> {
        Ok(match self {
            ActionKind::SetProperty => Action::SetProperty(serde_json::from_value(fields)?),
            ActionKind::AddValueToProperty => {
                Action::AddValueToProperty(serde_json::from_value(fields)?)
            }
            ActionKind::SayDialog => Action::SayDialog(serde_json::from_value(fields)?),
            ActionKind::Say => Action::Say(serde_json::from_value(fields)?),
            ActionKind::Animation => Action::Animation(serde_json::from_value(fields)?),
            ActionKind::SetState => Action::SetState(serde_json::from_value(fields)?),
            ActionKind::Tween => Action::Tween(serde_json::from_value(fields)?),
            ActionKind::Wait => Action::Wait(serde_json::from_value(fields)?),
            ActionKind::RunVerb => Action::RunVerb(serde_json::from_value(fields)?),
        })
    }
}

fn default_true() -> bool {
    true
}

/// Base fields shared by every step that can wait on an effect: whether it
/// waits at all, and the callback it is currently suspended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackLink {
    #[serde(default = "default_true")]
    pub wait: bool,
    #[serde(default)]
    pub callback: Option<ActionCallback>,
}

impl Default for CallbackLink {
    fn default() -> Self {
        Self {
            wait: true,
            callback: None,
        }
    }
}

impl CallbackLink {
    /// Callback to hand to the effect: none when the step doesn't wait.
    pub fn effect_callback(&self, callback: ActionCallback) -> Option<ActionCallback> {
        self.wait.then_some(callback)
    }

    pub fn suspend(&mut self, callback: ActionCallback) -> Step {
        self.callback = Some(callback);
        Step::Suspend
    }

    pub fn complete(&mut self) -> Step {
        self.callback = None;
        Step::Complete
    }

    pub fn is_pending(&self) -> bool {
        self.callback.is_some()
    }
}

/// Run/resume contract implemented by every action kind.
pub trait ActionBehavior {
    /// Does the synchronous work. `Suspend` means `callback` has been handed
    /// to an effect and [`resume`](Self::resume) will follow.
    fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError>;

    /// Called once per completion of the effect the step is waiting on.
    fn resume(
        &mut self,
        world: &mut World,
        callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        let _ = (world, callback);
        log::warn!("resume reached a step that never suspends");
        Ok(Step::Complete)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetProperty(SetPropertyAction),
    AddValueToProperty(AddValueToPropertyAction),
    SayDialog(SayDialogAction),
    Say(SayAction),
    Animation(AnimationAction),
    SetState(SetStateAction),
    Tween(TweenAction),
    Wait(WaitAction),
    RunVerb(RunVerbAction),
}

macro_rules! dispatch {
    ($action:expr, $inner:ident => $body:expr) => {
        match $action {
            Action::SetProperty($inner) => $body,
            Action::AddValueToProperty($inner) => $body,
            Action::SayDialog($inner) => $body,
            Action::Say($inner) => $body,
            Action::Animation($inner) => $body,
            Action::SetState($inner) => $body,
            Action::Tween($inner) => $body,
            Action::Wait($inner) => $body,
            Action::RunVerb($inner) => $body,
        }
    };
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SetProperty(_) => ActionKind::SetProperty,
            Action::AddValueToProperty(_) => ActionKind::AddValueToProperty,
            Action::SayDialog(_) => ActionKind::SayDialog,
            Action::Say(_) => ActionKind::Say,
            Action::Animation(_) => ActionKind::Animation,
            Action::SetState(_) => ActionKind::SetState,
            Action::Tween(_) => ActionKind::Tween,
            Action::Wait(_) => ActionKind::Wait,
            Action::RunVerb(_) => ActionKind::RunVerb,
        }
    }

    pub fn run(&mut self, world: &mut World, callback: ActionCallback) -> Result<Step, ActionError> {
        dispatch!(self, inner => inner.run(world, callback))
    }

    pub fn resume(
        &mut self,
        world: &mut World,
        callback: ActionCallback,
    ) -> Result<Step, ActionError> {
        dispatch!(self, inner => inner.resume(world, callback))
    }

    /// Builds an action from an authored definition such as
    /// `{"type": "wait", "time": 2}`. Required properties are checked and
    /// missing optional ones filled from the kind's declared defaults.
    pub fn from_definition(definition: &Value) -> Result<Self, ActionError> {
        let object = definition.as_object().ok_or(ActionError::NotAnObject)?;
        let tag = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ActionError::NotAnObject)?;
        let kind =
            ActionKind::from_tag(tag).ok_or_else(|| ActionError::UnknownType(tag.to_string()))?;

        let mut fields = Map::new();
        for property in kind.properties() {
            match object.get(property.name) {
                Some(Value::Null) | None if property.required => {
                    return Err(ActionError::MissingProperty {
                        kind: kind.tag(),
                        property: property.name,
                    });
                }
                Some(value) if !value.is_null() => {
                    if !property.kind.accepts(value) {
                        return Err(ActionError::PropertyType {
                            kind: kind.tag(),
                            property: property.name,
                            expected: property.kind.describe(),
                        });
                    }
                    fields.insert(property.name.to_string(), value.clone());
                }
                _ => {
                    if let Some(default) = property.default {
                        fields.insert(
                            property.name.to_string(),
                            property.kind.default_value(default),
                        );
                    }
                }
            }
        }

        for key in object.keys() {
            if key != "type" && !kind.properties().iter().any(|p| p.name == key) {
                log::warn!("{}: ignoring unknown property '{key}'", kind.tag());
            }
        }

        kind.construct(Value::Object(fields))
            .map_err(|source| ActionError::Definition {
                kind: kind.tag(),
                source,
            })
    }

    /// Captures the step, including any in-flight state.
    pub fn write(&self) -> Result<ActionSnapshot, SnapshotError> {
        let value = dispatch!(self, inner => serde_json::to_value(inner))
            .map_err(SnapshotError::Encode)?;
        let Value::Object(mut fields) = value else {
            return Err(SnapshotError::Malformed {
                tag: self.kind().tag().to_string(),
                reason: "action did not serialize to an object".to_string(),
            });
        };
        fields.insert(
            "type".to_string(),
            Value::String(self.kind().tag().to_string()),
        );
        Ok(ActionSnapshot::from_fields(fields))
    }

    /// Rebuilds a step from a snapshot. An unknown tag fails this snapshot
    /// only; callers decide what to do with the rest of the load.
    pub fn read(snapshot: &ActionSnapshot) -> Result<Self, SnapshotError> {
        let tag = snapshot.tag().ok_or(SnapshotError::MissingTag)?;
        let kind = ActionKind::from_tag(tag)
            .ok_or_else(|| SnapshotError::UnknownActionType(tag.to_string()))?;
        let mut fields = snapshot.fields().clone();
        fields.remove("type");
        kind.construct(Value::Object(fields))
            .map_err(|err| SnapshotError::Malformed {
                tag: tag.to_string(),
                reason: err.to_string(),
            })
    }

    /// True while the step is parked on a callback.
    pub fn is_pending(&self) -> bool {
        match self {
            Action::SayDialog(inner) => inner.link.is_pending(),
            Action::Say(inner) => inner.link.is_pending(),
            Action::Animation(inner) => inner.link.is_pending(),
            Action::Tween(inner) => inner.link.is_pending(),
            Action::Wait(inner) => inner.link.is_pending(),
            Action::RunVerb(inner) => inner.link.is_pending(),
            Action::SetProperty(_) | Action::AddValueToProperty(_) | Action::SetState(_) => false,
        }
    }
}
