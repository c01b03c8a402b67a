use serde::{Deserialize, Serialize};

use super::{ActionBehavior, ActionError, Step};
use crate::callback::ActionCallback;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPropertyAction {
    pub prop: String,
    pub value: String,
}

impl ActionBehavior for SetPropertyAction {
    fn run(&mut self, world: &mut World, _callback: ActionCallback) -> Result<Step, ActionError> {
        world.set_custom_property(&self.prop, self.value.clone());
        Ok(Step::Complete)
    }
}

/// Treats the property as an integer and adds `value` to it. Missing or
/// unparsable properties count as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddValueToPropertyAction {
    pub prop: String,
    pub value: f64,
}

impl ActionBehavior for AddValueToPropertyAction {
    fn run(&mut self, world: &mut World, _callback: ActionCallback) -> Result<Step, ActionError> {
        let current = match world.custom_property(&self.prop) {
            None => 0,
            Some(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
                log::warn!(
                    "property '{}' holds non-integer '{raw}', treating it as 0",
                    self.prop
                );
                0
            }),
        };
        // truncates toward zero
        let updated = (current as f64 + self.value) as i64;
        world.set_custom_property(&self.prop, updated.to_string());
        Ok(Step::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::RunnerId;
    use crate::config::EngineConfig;

    fn cb() -> ActionCallback {
        ActionCallback::new(RunnerId(1), 1)
    }

    fn add(world: &mut World, prop: &str, value: f64) {
        let mut action = AddValueToPropertyAction {
            prop: prop.into(),
            value,
        };
        assert_eq!(action.run(world, cb()).expect("run"), Step::Complete);
    }

    #[test]
    fn adds_to_existing_integer() {
        let mut world = World::new(EngineConfig::default());
        world.set_custom_property("coins", "5");
        add(&mut world, "coins", 3.0);
        assert_eq!(world.custom_property("coins"), Some("8"));
    }

    #[test]
    fn missing_or_garbage_counts_as_zero() {
        let mut world = World::new(EngineConfig::default());
        add(&mut world, "fresh", 2.0);
        assert_eq!(world.custom_property("fresh"), Some("2"));

        world.set_custom_property("broken", "lots");
        add(&mut world, "broken", 5.0);
        assert_eq!(world.custom_property("broken"), Some("5"));

        world.set_custom_property("padded", " 7");
        add(&mut world, "padded", 1.0);
        assert_eq!(world.custom_property("padded"), Some("1"));
    }

    #[test]
    fn fractional_sums_truncate() {
        let mut world = World::new(EngineConfig::default());
        world.set_custom_property("score", "1");
        add(&mut world, "score", 1.9);
        assert_eq!(world.custom_property("score"), Some("2"));
        add(&mut world, "score", -2.5);
        assert_eq!(world.custom_property("score"), Some("0"));
    }

    #[test]
    fn set_property_logs_and_stores() {
        let mut world = World::new(EngineConfig::default());
        let mut action = SetPropertyAction {
            prop: "door".into(),
            value: "open".into(),
        };
        action.run(&mut world, cb()).expect("run");
        assert_eq!(world.custom_property("door"), Some("open"));
        assert_eq!(world.events(), ["property.set door open"]);
    }
}
