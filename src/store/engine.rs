//! File-backed configuration store with a read-through cache.
//!
//! # Responsibilities
//! - Map a [`ConfigKey`] to `root/{domain}/[{locale}/]{category}.{ext}`
//! - Cache every loaded document, including ones missing on disk
//! - Merge caller defaults into stored documents without overwriting
//!
//! # Failure policy
//! Reads never fail: unreadable or malformed files are logged and treated
//! as empty documents. Write failures are logged and returned, but the
//! cache still reflects the attempted state.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::store::error::{StoreError, StoreResult};
use crate::store::format::format_for;
use crate::store::handle::ConfigHandle;
use crate::store::types::{validate_segment, ConfigKey, Domain, Document};

/// Distinguishes concurrent writers' temp files.
static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Persistent configuration documents plus their in-memory cache.
#[derive(Debug)]
pub struct ConfigStore {
    root: PathBuf,
    cache: DashMap<ConfigKey, Document>,
    /// Serializes `get_or_create` per document.
    registration_locks: DashMap<ConfigKey, Arc<Mutex<()>>>,
}

impl ConfigStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        tracing::info!(root = %root.display(), "Config store initialized");
        Self {
            root,
            cache: DashMap::new(),
            registration_locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &ConfigKey) -> PathBuf {
        let mut path = self.domain_dir(key.domain(), key.locale());
        path.push(format!("{}.{}", key.category(), format_for(key.domain()).extension()));
        path
    }

    fn domain_dir(&self, domain: Domain, locale: Option<&str>) -> PathBuf {
        let mut dir = self.root.join(domain.dir_name());
        if let Some(locale) = locale {
            dir.push(locale);
        }
        dir
    }

    /// Return the cached document, reading it from disk on a miss.
    pub fn load(&self, key: &ConfigKey) -> Document {
        if let Some(doc) = self.cache.get(key) {
            metrics::record_cache_lookup(true);
            return doc.value().clone();
        }
        metrics::record_cache_lookup(false);

        let doc = self.read_from_disk(key);
        self.cache
            .entry(key.clone())
            .or_insert(doc)
            .value()
            .clone()
    }

    fn read_from_disk(&self, key: &ConfigKey) -> Document {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(document = %key, "No document on disk");
                return Document::empty(key.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read document, using empty");
                return Document::empty(key.clone());
            }
        };

        match format_for(key.domain()).deserialize(&content) {
            Ok(values) => {
                tracing::debug!(document = %key, keys = values.len(), "Document loaded");
                Document::with_values(key.clone(), values)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed document, using empty");
                Document::empty(key.clone())
            }
        }
    }

    /// Persist a modified document and refresh the cache.
    ///
    /// Pending registrations are folded in first. Unmodified documents are
    /// left alone.
    pub fn save(&self, doc: &mut Document) -> StoreResult<()> {
        if !doc.is_modified() {
            return Ok(());
        }
        let registered = doc.flush_pending();
        if registered > 0 {
            metrics::record_registrations(doc.key().domain(), registered);
        }

        // Cache exactly what the next read from disk will return.
        let normalized = format_for(doc.key().domain()).normalize(doc.values().clone());
        if normalized != *doc.values() {
            tracing::warn!(
                document = %doc.key(),
                dropped = doc.values().len() - normalized.len(),
                "Keys shadowed by nested keys were dropped"
            );
            doc.replace_values(normalized);
        }

        self.cache.insert(doc.key().clone(), doc.clone());

        let result = self.write_to_disk(doc);
        metrics::record_document_write(doc.key().domain(), result.is_ok());
        match &result {
            Ok(()) => {
                doc.mark_saved();
                if let Some(mut cached) = self.cache.get_mut(doc.key()) {
                    cached.mark_saved();
                }
                tracing::info!(document = %doc.key(), keys = doc.values().len(), "Document saved");
            }
            Err(e) => {
                tracing::warn!(document = %doc.key(), error = %e, "Failed to persist document, keeping in-memory state");
            }
        }
        result
    }

    fn write_to_disk(&self, doc: &Document) -> StoreResult<()> {
        let path = self.path_for(doc.key());
        let content = format_for(doc.key().domain())
            .serialize(doc.key(), doc.values())
            .map_err(|source| StoreError::Format { path: path.clone(), source })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let tmp = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, content).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io(&path, e)
        })
    }

    /// Remove a document from disk and cache. Returns whether a file existed.
    pub fn delete(&self, key: &ConfigKey) -> bool {
        self.cache.remove(key);
        self.registration_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(document = %key, "Document deleted");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete document");
                false
            }
        }
    }

    /// Categories stored for `domain` (and `locale`, for translations), sorted.
    pub fn list_categories(&self, domain: Domain, locale: Option<&str>) -> StoreResult<Vec<String>> {
        if let Some(locale) = locale {
            validate_segment(locale)?;
        }
        let dir = self.domain_dir(domain, locale);
        let extension = format_for(domain).extension();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to list categories");
                return Ok(Vec::new());
            }
        };

        let mut categories: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        categories.sort();
        Ok(categories)
    }

    /// Return the stored values merged over `defaults`, persisting any
    /// default keys the document does not have yet.
    ///
    /// Existing values always win; a later caller with a different default
    /// for the same key never changes what is stored.
    pub fn get_or_create(
        &self,
        key: &ConfigKey,
        defaults: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let lock = self
            .registration_locks
            .entry(key.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut doc = self.load(key);
        if defaults.is_empty() {
            return doc.values().clone();
        }

        if doc.is_empty() {
            tracing::info!(document = %key, keys = defaults.len(), "Seeding new document from defaults");
        }
        self.register_missing(&mut doc, defaults);

        let mut merged = defaults.clone();
        merged.extend(doc.values().iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Add and persist the defaults `doc` lacks. Returns how many were added.
    fn register_missing(&self, doc: &mut Document, defaults: &BTreeMap<String, String>) -> usize {
        let added = doc.merge_missing(defaults);
        if added > 0 {
            tracing::debug!(document = %doc.key(), added, "Registering new default keys");
            metrics::record_registrations(doc.key().domain(), added);
            let _ = self.save(doc);
        }
        added
    }

    /// Open a fluent view over one document.
    pub fn handle(&self, key: ConfigKey) -> ConfigHandle<'_> {
        ConfigHandle::new(self, self.load(&key))
    }

    /// Drop every cached document; the next load re-reads disk.
    pub fn clear_cache(&self) {
        let count = self.cache.len();
        self.cache.clear();
        self.registration_locks
            .retain(|_, lock| Arc::strong_count(lock) > 1);
        tracing::info!(documents = count, "Config cache cleared");
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}
