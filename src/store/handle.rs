//! Fluent per-document view with deferred key registration.
//!
//! Reading a key with a default that the document does not contain queues
//! the key for registration. Nothing is written until [`ConfigHandle::save`]
//! is called; dropping a handle with unsaved changes logs a warning.

use std::collections::BTreeMap;

use crate::store::engine::ConfigStore;
use crate::store::error::StoreResult;
use crate::store::types::{ConfigKey, Document};

/// Read/write view over one document of a [`ConfigStore`].
pub struct ConfigHandle<'a> {
    store: &'a ConfigStore,
    doc: Document,
}

impl<'a> ConfigHandle<'a> {
    pub(crate) fn new(store: &'a ConfigStore, doc: Document) -> Self {
        Self { store, doc }
    }

    pub fn key(&self) -> &ConfigKey {
        self.doc.key()
    }

    /// Stored value, or `default` after queueing the key for registration.
    pub fn get_or_register(&mut self, key: &str, default: &str) -> String {
        match self.doc.get(key) {
            Some(value) => value.to_string(),
            None => {
                if self.doc.register(key, default) {
                    tracing::debug!(document = %self.doc.key(), key, "Queued key for registration");
                }
                default.to_string()
            }
        }
    }

    /// Plain lookup without side effects.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.doc.get(key)
    }

    pub fn get_int(&mut self, key: &str, default: i64) -> i64 {
        self.get_parsed(key, default)
    }

    pub fn get_f64(&mut self, key: &str, default: f64) -> f64 {
        self.get_parsed(key, default)
    }

    /// `true`/`false` in any case; anything else yields `default`.
    pub fn get_bool(&mut self, key: &str, default: bool) -> bool {
        let raw = self.get_or_register(key, &default.to_string());
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => default,
        }
    }

    fn get_parsed<T>(&mut self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + ToString,
    {
        let raw = self.get_or_register(key, &default.to_string());
        raw.trim().parse().unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.doc.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.doc.remove(key)
    }

    /// Current stored values, excluding pending registrations.
    pub fn values(&self) -> &BTreeMap<String, String> {
        self.doc.values()
    }

    pub fn pending(&self) -> &BTreeMap<String, String> {
        self.doc.pending()
    }

    pub fn is_modified(&self) -> bool {
        self.doc.is_modified()
    }

    /// Persist changes and pending registrations.
    pub fn save(&mut self) -> StoreResult<&mut Self> {
        self.store.save(&mut self.doc)?;
        Ok(self)
    }
}

impl Drop for ConfigHandle<'_> {
    fn drop(&mut self) {
        if self.doc.is_modified() {
            tracing::warn!(
                document = %self.doc.key(),
                pending = self.doc.pending().len(),
                "Config handle dropped with unsaved changes"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::Domain;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ConfigStore, ConfigKey) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        let key = ConfigKey::global(Domain::Application, "worker").unwrap();
        (dir, store, key)
    }

    #[test]
    fn test_registration_is_deferred_until_save() {
        let (_dir, store, key) = setup();
        let mut handle = store.handle(key.clone());

        assert_eq!(handle.get_or_register("threads", "4"), "4");
        assert!(handle.is_modified());
        assert_eq!(handle.get("threads"), None);
        assert!(!store.path_for(&key).exists());

        handle.save().unwrap();
        assert!(!handle.is_modified());
        drop(handle);

        store.clear_cache();
        assert_eq!(store.load(&key).get("threads"), Some("4"));
    }

    #[test]
    fn test_unsaved_registration_is_not_persisted() {
        let (_dir, store, key) = setup();
        {
            let mut handle = store.handle(key.clone());
            handle.get_or_register("threads", "4");
        }
        assert!(store.load(&key).is_empty());
    }

    #[test]
    fn test_registration_never_overwrites() {
        let (_dir, store, key) = setup();
        store.handle(key.clone()).set("threads", "16").save().unwrap();

        let mut handle = store.handle(key.clone());
        assert_eq!(handle.get_or_register("threads", "4"), "16");
        assert!(!handle.is_modified());
    }

    #[test]
    fn test_typed_getters_fall_back() {
        let (_dir, store, key) = setup();
        let mut handle = store.handle(key);
        handle.set("port", "8080").set("ratio", "0.25").set("debug", "TRUE").set("bad", "x");

        assert_eq!(handle.get_int("port", 1), 8080);
        assert_eq!(handle.get_int("bad", 7), 7);
        assert_eq!(handle.get_int("missing", 3), 3);
        assert_eq!(handle.get_f64("ratio", 1.0), 0.25);
        assert_eq!(handle.get_f64("bad", 1.5), 1.5);
        assert!(handle.get_bool("debug", false));
        assert!(handle.get_bool("bad", true));
        assert!(!handle.get_bool("verbose", false));

        assert_eq!(handle.pending().get("missing").map(String::as_str), Some("3"));
        assert_eq!(handle.pending().get("verbose").map(String::as_str), Some("false"));
        handle.save().unwrap();
    }

    #[test]
    fn test_set_and_remove_round_trip() {
        let (_dir, store, key) = setup();
        store
            .handle(key.clone())
            .set("a", "1")
            .set("b", "2")
            .save()
            .unwrap();

        let mut handle = store.handle(key.clone());
        assert!(handle.remove("a"));
        assert!(!handle.remove("zzz"));
        handle.save().unwrap();
        drop(handle);

        store.clear_cache();
        let values = store.load(&key).values().clone();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("b").map(String::as_str), Some("2"));
    }
}
