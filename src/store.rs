use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

/// A named-blob store with expiring entries.
///
/// The web layer backs this with the browser cookie jar; tests and embedders
/// can use [`MemoryStore`]. Implementations own the raw string representation;
/// JSON encoding lives in [`save_state`]/[`load_state`] on top.
pub trait StateStore {
    /// Raw value under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, expiring `ttl_days` days from now.
    /// Fully replaces any previous value under the same key.
    fn set(&mut self, key: &str, value: String, ttl_days: i64);

    /// Drop any value stored under `key`.
    fn clear(&mut self, key: &str);
}

/// Serialize `value` as JSON and store it under `key`.
pub fn save_state<S, T>(store: &mut S, key: &str, value: &T, ttl_days: i64)
where
    S: StateStore + ?Sized,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => store.set(key, json, ttl_days),
        // PersistedState always serializes; this guards future value types
        Err(e) => log::error!("failed to serialize state for '{}': {}", key, e),
    }
}

/// Load and JSON-decode the value under `key`.
///
/// Returns `None` when the key is absent or the stored text does not parse;
/// a parse failure is logged and treated the same as no saved state.
pub fn load_state<S, T>(store: &S, key: &str) -> Option<T>
where
    S: StateStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("error parsing saved state under '{}': {}", key, e);
            None
        }
    }
}

/// In-memory [`StateStore`] with the same expiry semantics as a cookie jar.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, (String, OffsetDateTime)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let (value, expires) = self.entries.get(key)?;
        if *expires <= OffsetDateTime::now_utc() {
            return None;
        }
        Some(value.clone())
    }

    fn set(&mut self, key: &str, value: String, ttl_days: i64) {
        let expires = OffsetDateTime::now_utc() + Duration::days(ttl_days);
        self.entries.insert(key.to_string(), (value, expires));
    }

    fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Blob {
        label: String,
        count: u32,
    }

    #[test]
    fn round_trip_returns_a_deep_equal_value() {
        let mut store = MemoryStore::new();
        let blob = Blob {
            label: "boxes".to_string(),
            count: 3,
        };

        save_state(&mut store, "blob", &blob, 30);
        let loaded: Option<Blob> = load_state(&store, "blob");
        assert_eq!(loaded, Some(blob));
    }

    #[test]
    fn absent_key_loads_as_none() {
        let store = MemoryStore::new();
        let loaded: Option<Blob> = load_state(&store, "missing");
        assert_eq!(loaded, None);
    }

    #[test]
    fn corrupt_json_loads_as_none() {
        let mut store = MemoryStore::new();
        store.set("blob", "{not json".to_string(), 30);
        let loaded: Option<Blob> = load_state(&store, "blob");
        assert_eq!(loaded, None);
    }

    #[test]
    fn save_replaces_the_previous_blob_wholesale() {
        let mut store = MemoryStore::new();
        save_state(
            &mut store,
            "blob",
            &Blob {
                label: "old".to_string(),
                count: 1,
            },
            30,
        );
        save_state(
            &mut store,
            "blob",
            &Blob {
                label: "new".to_string(),
                count: 2,
            },
            30,
        );

        let loaded: Option<Blob> = load_state(&store, "blob");
        assert_eq!(loaded.unwrap().label, "new");
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let mut store = MemoryStore::new();
        store.set("blob", "\"value\"".to_string(), -1);
        assert_eq!(store.get("blob"), None);
    }

    #[test]
    fn clear_drops_the_entry() {
        let mut store = MemoryStore::new();
        store.set("blob", "\"value\"".to_string(), 30);
        store.clear("blob");
        assert_eq!(store.get("blob"), None);
    }
}
