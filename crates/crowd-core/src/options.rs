//! String-keyed option dictionaries.
//!
//! Modules receive their configuration and agents receive their behavioural
//! parameters as `key → value` string maps, parsed into typed values on
//! demand.  Unknown keys are ignored by consumers; malformed values are
//! reported at warn level and the default is kept, so a typo in one
//! parameter never aborts a simulation.

use std::collections::BTreeMap;

use tracing::warn;

/// Options passed to a module at load time (`key → value`).
///
/// A `BTreeMap` keeps iteration order deterministic, which matters for
/// reproducible option-application logs.
pub type OptionDictionary = BTreeMap<String, String>;

/// A named behaviour: the steering-parameter overrides applied to an agent
/// via `set_parameters`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Behaviour {
    pub name: String,
    pub parameters: Vec<(String, String)>,
}

impl Behaviour {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parameters: Vec::new() }
    }

    /// Builder-style parameter append.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Apply every recognised parameter through `apply(key, value)`.
    ///
    /// The callback returns `false` for keys it does not recognise; those
    /// are skipped silently (a behaviour may carry parameters for several
    /// agent kinds at once).
    pub fn apply_each(&self, mut apply: impl FnMut(&str, &str) -> bool) {
        for (key, value) in &self.parameters {
            let _ = apply(key, value);
        }
    }
}

/// Parse a float option value, keeping `current` and warning on failure.
pub fn parse_f32(key: &str, value: &str, current: f32) -> f32 {
    match value.trim().parse::<f32>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value, "ignoring unparsable float option");
            current
        }
    }
}

/// Parse an integer option value, keeping `current` and warning on failure.
pub fn parse_u32(key: &str, value: &str, current: u32) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value, "ignoring unparsable integer option");
            current
        }
    }
}

/// Interpret an option as a flag: absent value, "1", "true", and "on" are
/// truthy; everything else is falsy.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "" | "1" | "true" | "on")
}
