//! Signal bundles pushed to connected clients
//!
//! A signal bundle is a flat key/value map delivered over the push channel
//! in submission order. Clients bind signal names to display state, so the
//! key set is the wire contract with the front end.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat key/value signal bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signals(Map<String, Value>);

impl Signals {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a signal value, consuming and returning the bundle for chaining
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set a signal from any serializable value.
    ///
    /// Serialization failures degrade to JSON null rather than erroring;
    /// a malformed signal must never take down the emitting loop.
    pub fn set_json(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.to_string(), value);
        self
    }

    /// Look up a signal value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the bundle, yielding the underlying map
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_roundtrip() {
        let signals = Signals::new()
            .set("word", "reading")
            .set("running", true)
            .set("current_word", 3u64);

        assert_eq!(signals.len(), 3);
        assert_eq!(signals.get("word"), Some(&Value::from("reading")));
        assert_eq!(signals.get("running"), Some(&Value::from(true)));
        assert_eq!(signals.get("current_word"), Some(&Value::from(3u64)));
    }

    #[test]
    fn serializes_flat() {
        let signals = Signals::new().set("wpm", 300u64).set("running", false);
        let json = serde_json::to_string(&signals).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["wpm"], 300);
        assert_eq!(value["running"], false);
    }
}
