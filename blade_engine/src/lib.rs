//! Cooperative verb/action runtime for point-and-click adventure games.
//!
//! A [`VerbScheduler`] owns the [`World`] and runs verbs as sequences of
//! [`Action`]s. Actions that wait on an effect (a subtitle, an animation, a
//! tween, a timer) suspend their [`VerbRunner`] and are resumed through an
//! [`ActionCallback`] once the effect finishes. The whole state, including
//! suspended actions, can be saved and restored with [`SaveGame`].

pub mod action;
pub mod callback;
pub mod config;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod story;
pub mod tween;
pub mod verb;
pub mod world;

pub use action::{Action, ActionError, ActionKind, ActionProperty, Step};
pub use callback::{ActionCallback, RunnerId};
pub use config::EngineConfig;
pub use runner::{RunnerStatus, VerbRunner};
pub use scheduler::VerbScheduler;
pub use snapshot::{ActionSnapshot, LoadReport, RunnerSnapshot, SaveGame, SnapshotError};
pub use story::Story;
pub use verb::{Verb, VerbError, VerbKey, VerbManager};
pub use world::World;
