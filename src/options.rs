//! Simulator-wide options applied identically to every test in a run.
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Setup-phase option registry; the latest value for a name wins.
#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    values: BTreeMap<String, Value>,
}

impl SimOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `name`, returning the value it replaced.
    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        let previous = self.values.insert(name.clone(), value.clone());
        if let Some(previous) = &previous {
            tracing::debug!(option = %name, %previous, %value, "sim option overwritten");
        }
        previous
    }

    /// Current options, ordered by name.
    pub fn get_options(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn freeze(self) -> FrozenOptions {
        FrozenOptions {
            values: self.values,
        }
    }
}

/// Read-only options handed to the orchestrator.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FrozenOptions {
    values: BTreeMap<String, Value>,
}

impl FrozenOptions {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn latest_value_wins() {
        let mut options = SimOptions::new();
        assert_eq!(options.set_option("disable_ieee_warnings", 0), None);
        assert_eq!(
            options.set_option("disable_ieee_warnings", 1),
            Some(json!(0))
        );

        let frozen = options.freeze();
        assert_eq!(frozen.get("disable_ieee_warnings"), Some(&json!(1)));
        assert_eq!(frozen.len(), 1);
    }

    #[test]
    fn options_serialize_as_a_flat_object() {
        let mut options = SimOptions::new();
        options.set_option("modelsim.vsim_flags", "-t ps");
        options.set_option("disable_ieee_warnings", true);

        let rendered = serde_json::to_value(options.freeze()).expect("serialize options");
        assert_eq!(
            rendered,
            json!({"disable_ieee_warnings": true, "modelsim.vsim_flags": "-t ps"})
        );
    }
}
