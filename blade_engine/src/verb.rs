//! Verb definitions and the catalog the scheduler looks them up in.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::{Action, ActionError};

/// A named, ordered list of actions, optionally gated on actor state.
#[derive(Debug, Clone, PartialEq)]
pub struct Verb {
    pub id: String,
    pub state: Option<String>,
    pub target: Option<String>,
    pub actions: Vec<Action>,
}

impl Verb {
    pub fn new(id: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            id: id.into(),
            state: None,
            target: None,
            actions,
        }
    }

    /// Key the verb is stored under: `id.state` for gated verbs, `id` otherwise.
    pub fn key(&self) -> String {
        match &self.state {
            Some(state) => format!("{}.{state}", self.id),
            None => self.id.clone(),
        }
    }

    pub fn is_eligible(&self, state: Option<&str>, target: Option<&str>) -> bool {
        let state_ok = self
            .state
            .as_deref()
            .map_or(true, |required| Some(required) == state);
        let target_ok = self
            .target
            .as_deref()
            .map_or(true, |required| Some(required) == target);
        state_ok && target_ok
    }
}

/// Authored form of a verb, as found in story files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbDefinition {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
}

impl VerbDefinition {
    pub fn build(&self) -> Result<Verb, VerbError> {
        let actions = self
            .actions
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                Action::from_definition(definition).map_err(|source| VerbError::InvalidAction {
                    verb: self.id.clone(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Verb {
            id: self.id.clone(),
            state: self.state.clone(),
            target: self.target.clone(),
            actions,
        })
    }
}

/// Execution context of a verb: at most one runner per key is live.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerbKey {
    pub verb: String,
    #[serde(default)]
    pub actor: Option<String>,
}

impl VerbKey {
    pub fn new(verb: impl Into<String>, actor: Option<&str>) -> Self {
        Self {
            verb: verb.into(),
            actor: actor.map(str::to_string),
        }
    }
}

impl fmt::Display for VerbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actor {
            Some(actor) => write!(f, "{}@{actor}", self.verb),
            None => write!(f, "{}@<world>", self.verb),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerbError {
    #[error("verb {0} is already running")]
    Busy(VerbKey),
    #[error("verb '{verb}' is not available in state {state:?}")]
    NotEligible { verb: String, state: Option<String> },
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),
    #[error("actor '{0}' not found")]
    UnknownActor(String),
    #[error("dialog option {0} is not available")]
    NoDialogOption(usize),
    #[error("verb '{verb}' action #{index}: {source}")]
    InvalidAction {
        verb: String,
        index: usize,
        #[source]
        source: ActionError,
    },
}

/// Verbs sharing a storage key, told apart by their target.
type VerbTable = BTreeMap<String, Vec<Verb>>;

fn insert_verb(table: &mut VerbTable, verb: Verb) {
    let slot = table.entry(verb.key()).or_default();
    match slot.iter_mut().find(|existing| existing.target == verb.target) {
        Some(existing) => *existing = verb,
        None => slot.push(verb),
    }
}

/// Picks the eligible verb under one key, preferring an exact target match
/// over a verb that accepts any target.
fn pick<'a>(
    candidates: &'a [Verb],
    state: Option<&str>,
    target: Option<&str>,
) -> Option<&'a Verb> {
    let mut eligible = candidates
        .iter()
        .filter(|verb| verb.is_eligible(state, target));
    let first = eligible.next()?;
    if first.target.is_some() {
        return Some(first);
    }
    Some(eligible.find(|verb| verb.target.is_some()).unwrap_or(first))
}

/// World verbs plus per-actor verbs.
#[derive(Debug, Default, Clone)]
pub struct VerbManager {
    world: VerbTable,
    actors: BTreeMap<String, VerbTable>,
}

impl VerbManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a world verb. A verb with the same key and target is replaced.
    pub fn add_world_verb(&mut self, verb: Verb) {
        insert_verb(&mut self.world, verb);
    }

    pub fn add_actor_verb(&mut self, actor: &str, verb: Verb) {
        insert_verb(self.actors.entry(actor.to_string()).or_default(), verb);
    }

    pub fn world_verbs(&self) -> impl Iterator<Item = &Verb> {
        self.world.values().flatten()
    }

    pub fn actor_verbs(&self, actor: &str) -> impl Iterator<Item = &Verb> {
        self.actors
            .get(actor)
            .into_iter()
            .flat_map(|table| table.values().flatten())
    }

    pub fn len(&self) -> usize {
        let count = |table: &VerbTable| table.values().map(Vec::len).sum::<usize>();
        count(&self.world) + self.actors.values().map(count).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the verb to run. Actor scope is searched before world scope and
    /// within a scope `id.state` wins over the plain `id`.
    pub fn lookup(
        &self,
        id: &str,
        actor: Option<&str>,
        state: Option<&str>,
        target: Option<&str>,
    ) -> Result<&Verb, VerbError> {
        let scopes: Vec<&VerbTable> = actor
            .and_then(|actor| self.actors.get(actor))
            .into_iter()
            .chain(std::iter::once(&self.world))
            .collect();

        let mut keys = Vec::with_capacity(2);
        if let Some(state) = state {
            keys.push(format!("{id}.{state}"));
        }
        keys.push(id.to_string());

        for scope in &scopes {
            for key in &keys {
                if let Some(verb) = scope.get(key).and_then(|slot| pick(slot, state, target)) {
                    return Ok(verb);
                }
            }
        }

        let known = scopes
            .iter()
            .any(|scope| scope.values().flatten().any(|verb| verb.id == id));
        if known {
            Err(VerbError::NotEligible {
                verb: id.to_string(),
                state: state.map(str::to_string),
            })
        } else {
            Err(VerbError::UnknownVerb(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated(id: &str, state: &str) -> Verb {
        Verb {
            state: Some(state.to_string()),
            ..Verb::new(id, Vec::new())
        }
    }

    #[test]
    fn state_keyed_verb_wins() {
        let mut verbs = VerbManager::new();
        verbs.add_actor_verb("door", Verb::new("lookat", Vec::new()));
        verbs.add_actor_verb("door", gated("lookat", "open"));

        let open = verbs
            .lookup("lookat", Some("door"), Some("open"), None)
            .expect("gated verb");
        assert_eq!(open.key(), "lookat.open");
        let closed = verbs
            .lookup("lookat", Some("door"), Some("closed"), None)
            .expect("plain verb");
        assert_eq!(closed.key(), "lookat");
    }

    #[test]
    fn actor_scope_before_world_scope() {
        let mut verbs = VerbManager::new();
        verbs.add_world_verb(Verb::new("pickup", Vec::new()));
        verbs.add_actor_verb("coin", gated("pickup", "shiny"));

        let verb = verbs
            .lookup("pickup", Some("coin"), Some("shiny"), None)
            .expect("actor verb");
        assert_eq!(verb.state.as_deref(), Some("shiny"));
        let verb = verbs
            .lookup("pickup", Some("coin"), None, None)
            .expect("world fallback");
        assert_eq!(verb.state, None);
        assert_eq!(verbs.len(), 2);
    }

    #[test]
    fn mismatched_state_is_not_eligible() {
        let mut verbs = VerbManager::new();
        verbs.add_actor_verb("door", gated("open", "closed"));

        assert!(matches!(
            verbs.lookup("open", Some("door"), Some("open"), None),
            Err(VerbError::NotEligible { verb, state }) if verb == "open" && state.as_deref() == Some("open")
        ));
        assert!(matches!(
            verbs.lookup("dance", Some("door"), None, None),
            Err(VerbError::UnknownVerb(id)) if id == "dance"
        ));
    }

    #[test]
    fn target_filter_applies() {
        let mut verbs = VerbManager::new();
        verbs.add_actor_verb(
            "lock",
            Verb {
                target: Some("key".into()),
                ..Verb::new("use", Vec::new())
            },
        );
        assert!(verbs.lookup("use", Some("lock"), None, Some("key")).is_ok());
        assert!(matches!(
            verbs.lookup("use", Some("lock"), None, Some("banana")),
            Err(VerbError::NotEligible { .. })
        ));
    }

    #[test]
    fn verbs_differing_by_target_coexist() {
        let targeted = |target: &str, prop: &str| Verb {
            target: Some(target.into()),
            ..Verb::new(
                "use",
                vec![Action::from_definition(&serde_json::json!({
                    "type": "set_property", "prop": prop, "value": "yes"
                }))
                .expect("action")],
            )
        };
        let mut verbs = VerbManager::new();
        verbs.add_actor_verb("lock", targeted("key", "unlocked"));
        verbs.add_actor_verb("lock", targeted("coin", "jammed"));
        verbs.add_actor_verb("lock", Verb::new("use", Vec::new()));
        assert_eq!(verbs.actor_verbs("lock").count(), 3);

        let with_key = verbs
            .lookup("use", Some("lock"), None, Some("key"))
            .expect("key verb");
        assert_eq!(with_key.target.as_deref(), Some("key"));
        let with_coin = verbs
            .lookup("use", Some("lock"), None, Some("coin"))
            .expect("coin verb");
        assert_eq!(with_coin.target.as_deref(), Some("coin"));
        let bare = verbs
            .lookup("use", Some("lock"), None, Some("banana"))
            .expect("untargeted fallback");
        assert_eq!(bare.target, None);

        verbs.add_actor_verb("lock", targeted("key", "opened"));
        assert_eq!(verbs.len(), 3, "same key and target replaces");
    }

    #[test]
    fn definition_builds_actions_in_order() {
        let definition: VerbDefinition = serde_json::from_value(serde_json::json!({
            "id": "greet",
            "actions": [
                { "type": "set_property", "prop": "greeted", "value": "yes" },
                { "type": "wait", "time": 1 }
            ]
        }))
        .expect("definition");
        let verb = definition.build().expect("build");
        assert_eq!(verb.actions.len(), 2);
        assert_eq!(verb.actions[1].kind().tag(), "wait");

        let broken: VerbDefinition = serde_json::from_value(serde_json::json!({
            "id": "broken",
            "actions": [{ "type": "wait" }]
        }))
        .expect("definition");
        assert!(matches!(
            broken.build(),
            Err(VerbError::InvalidAction { index: 0, .. })
        ));
    }
}
