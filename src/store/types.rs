//! Document identity and in-memory representation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::error::{StoreError, StoreResult};

/// Tag selecting the storage path convention and serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Translation,
    Application,
    FeatureFlag,
    Custom,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Translation,
        Domain::Application,
        Domain::FeatureFlag,
        Domain::Custom,
    ];

    /// Name used in URLs and JSON (`FEATURE_FLAG`).
    pub fn wire_name(self) -> &'static str {
        match self {
            Domain::Translation => "TRANSLATION",
            Domain::Application => "APPLICATION",
            Domain::FeatureFlag => "FEATURE_FLAG",
            Domain::Custom => "CUSTOM",
        }
    }

    /// Directory under the storage root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Domain::Translation => "translation",
            Domain::Application => "application",
            Domain::FeatureFlag => "feature_flag",
            Domain::Custom => "custom",
        }
    }

    /// Whether documents of this domain are keyed by locale.
    pub fn requires_locale(self) -> bool {
        matches!(self, Domain::Translation)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Domain {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Domain::ALL
            .into_iter()
            .find(|d| d.wire_name() == normalized)
            .ok_or_else(|| StoreError::UnknownDomain(s.to_string()))
    }
}

/// Identifies one persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    domain: Domain,
    category: String,
    locale: Option<String>,
}

impl ConfigKey {
    /// Build a key, enforcing the locale rule and rejecting segments that
    /// could escape the storage root.
    pub fn new(
        domain: Domain,
        category: impl Into<String>,
        locale: Option<impl Into<String>>,
    ) -> StoreResult<Self> {
        let category = category.into();
        let locale = locale.map(Into::into);

        validate_segment(&category)?;
        match (&locale, domain.requires_locale()) {
            (None, true) => return Err(StoreError::LocaleRequired(domain)),
            (Some(_), false) => return Err(StoreError::LocaleNotAllowed(domain)),
            (Some(l), true) => validate_segment(l)?,
            (None, false) => {}
        }

        Ok(Self { domain, category, locale })
    }

    /// Key for a non-translation document.
    pub fn global(domain: Domain, category: impl Into<String>) -> StoreResult<Self> {
        Self::new(domain, category, None::<String>)
    }

    /// Key for a translation document.
    pub fn translation(category: impl Into<String>, locale: impl Into<String>) -> StoreResult<Self> {
        Self::new(Domain::Translation, category, Some(locale))
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locale {
            Some(locale) => write!(f, "{}/{}/{}", self.domain, self.category, locale),
            None => write!(f, "{}/{}", self.domain, self.category),
        }
    }
}

/// Reject anything that is not a single, plain path segment.
pub(crate) fn validate_segment(segment: &str) -> StoreResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

/// The full key/value set persisted for one [`ConfigKey`].
///
/// Values are kept sorted so serialization is deterministic. Keys requested
/// with a default but not yet stored wait in `pending` until the next save.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    key: ConfigKey,
    values: BTreeMap<String, String>,
    pending: BTreeMap<String, String>,
    modified: bool,
}

impl Document {
    /// An empty, unmodified document.
    pub fn empty(key: ConfigKey) -> Self {
        Self::with_values(key, BTreeMap::new())
    }

    /// A document holding already-persisted values.
    pub fn with_values(key: ConfigKey, values: BTreeMap<String, String>) -> Self {
        Self {
            key,
            values,
            pending: BTreeMap::new(),
            modified: false,
        }
    }

    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn pending(&self) -> &BTreeMap<String, String> {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overwrite a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.pending.remove(&key);
        self.values.insert(key, value.into());
        self.modified = true;
    }

    /// Remove a value; returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some() | self.pending.remove(key).is_some();
        if removed {
            self.modified = true;
        }
        removed
    }

    /// Queue `key` for auto-registration unless it is already stored or
    /// queued. Returns whether it was newly queued.
    pub fn register(&mut self, key: &str, default: &str) -> bool {
        if self.values.contains_key(key) || self.pending.contains_key(key) {
            return false;
        }
        self.pending.insert(key.to_string(), default.to_string());
        self.modified = true;
        true
    }

    /// Add every entry of `defaults` whose key is absent. Existing values are
    /// never touched. Returns the number of keys added.
    pub fn merge_missing(&mut self, defaults: &BTreeMap<String, String>) -> usize {
        let mut added = 0;
        for (key, value) in defaults {
            if !self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.modified = true;
        }
        added
    }

    /// Fold pending registrations into the values. Returns how many were added.
    pub(crate) fn flush_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        self.merge_missing(&pending)
    }

    pub(crate) fn replace_values(&mut self, values: BTreeMap<String, String>) {
        self.values = values;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.modified = false;
    }
}
