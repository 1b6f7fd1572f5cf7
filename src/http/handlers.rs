//! Request handlers for the `/config` API.
//!
//! Path shapes:
//! - `/config/{domain}/{category}` for non-translation documents
//! - `/config/{domain}/{category}/{segment}`: the locale for translations,
//!   a key for every other domain
//! - `/config/{domain}/{category}/{locale}/{key}` for translation keys

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::store::{ConfigKey, ConfigStore, Domain, StoreError, StoreResult};

type Values = BTreeMap<String, String>;

/// Body of a single-key update.
#[derive(Debug, Deserialize, Serialize)]
pub struct SetValue {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cached_documents: usize,
}

fn document_key(domain: &str, category: String, locale: Option<String>) -> StoreResult<ConfigKey> {
    let domain: Domain = domain.parse()?;
    ConfigKey::new(domain, category, locale)
}

/// Run store work on the blocking pool; the store does synchronous file I/O
/// and holds per-document locks.
async fn with_store<T, F>(state: &AppState, work: F) -> StoreResult<T>
where
    F: FnOnce(&ConfigStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || work(&store)).await?
}

// Documents

pub async fn register_defaults(
    State(state): State<AppState>,
    Path((domain, category)): Path<(String, String)>,
    Json(defaults): Json<Values>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, None)?;
    with_store(&state, move |store| Ok(store.get_or_create(&key, &defaults)))
        .await
        .map(Json)
}

pub async fn register_localized_defaults(
    State(state): State<AppState>,
    Path((domain, category, locale)): Path<(String, String, String)>,
    Json(defaults): Json<Values>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, Some(locale))?;
    with_store(&state, move |store| Ok(store.get_or_create(&key, &defaults)))
        .await
        .map(Json)
}

pub async fn get_document(
    State(state): State<AppState>,
    Path((domain, category)): Path<(String, String)>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, None)?;
    with_store(&state, move |store| Ok(store.load(&key).values().clone()))
        .await
        .map(Json)
}

pub async fn get_localized_document(
    State(state): State<AppState>,
    Path((domain, category, locale)): Path<(String, String, String)>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, Some(locale))?;
    with_store(&state, move |store| Ok(store.load(&key).values().clone()))
        .await
        .map(Json)
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((domain, category)): Path<(String, String)>,
) -> StoreResult<StatusCode> {
    let key = document_key(&domain, category, None)?;
    with_store(&state, move |store| remove_document(store, key)).await
}

fn remove_document(store: &ConfigStore, key: ConfigKey) -> StoreResult<StatusCode> {
    if store.delete(&key) {
        Ok(StatusCode::OK)
    } else {
        Err(StoreError::NotFound(key.to_string()))
    }
}

// Keys

fn write_value(store: &ConfigStore, key: ConfigKey, name: String, value: String) -> StoreResult<Values> {
    let mut handle = store.handle(key);
    handle.set(name, value).save()?;
    Ok(handle.values().clone())
}

fn remove_value(store: &ConfigStore, key: ConfigKey, name: &str) -> StoreResult<Values> {
    let mut handle = store.handle(key);
    if handle.remove(name) {
        handle.save()?;
    }
    Ok(handle.values().clone())
}

/// `PUT /config/{domain}/{category}/{key}`
pub async fn set_value(
    State(state): State<AppState>,
    Path((domain, category, name)): Path<(String, String, String)>,
    Json(body): Json<SetValue>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, None)?;
    with_store(&state, move |store| write_value(store, key, name, body.value))
        .await
        .map(Json)
}

/// `PUT /config/{domain}/{category}/{locale}/{key}`
pub async fn set_localized_value(
    State(state): State<AppState>,
    Path((domain, category, locale, name)): Path<(String, String, String, String)>,
    Json(body): Json<SetValue>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, Some(locale))?;
    with_store(&state, move |store| write_value(store, key, name, body.value))
        .await
        .map(Json)
}

/// `DELETE /config/{domain}/{category}/{segment}`: removes a translation
/// document, or a key of any other document.
pub async fn delete_segment(
    State(state): State<AppState>,
    Path((domain, category, segment)): Path<(String, String, String)>,
) -> Result<(StatusCode, Json<Values>), StoreError> {
    let parsed: Domain = domain.parse()?;
    if parsed.requires_locale() {
        let key = ConfigKey::new(parsed, category, Some(segment))?;
        let status = with_store(&state, move |store| remove_document(store, key)).await?;
        return Ok((status, Json(Values::new())));
    }
    let key = ConfigKey::global(parsed, category)?;
    let values = with_store(&state, move |store| remove_value(store, key, &segment)).await?;
    Ok((StatusCode::OK, Json(values)))
}

/// `DELETE /config/{domain}/{category}/{locale}/{key}`
pub async fn delete_localized_value(
    State(state): State<AppState>,
    Path((domain, category, locale, name)): Path<(String, String, String, String)>,
) -> StoreResult<Json<Values>> {
    let key = document_key(&domain, category, Some(locale))?;
    with_store(&state, move |store| remove_value(store, key, &name))
        .await
        .map(Json)
}

// Listing and maintenance

pub async fn list_categories(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> StoreResult<Json<Vec<String>>> {
    let domain: Domain = domain.parse()?;
    if domain.requires_locale() {
        return Err(StoreError::LocaleRequired(domain));
    }
    with_store(&state, move |store| store.list_categories(domain, None))
        .await
        .map(Json)
}

pub async fn list_localized_categories(
    State(state): State<AppState>,
    Path((domain, locale)): Path<(String, String)>,
) -> StoreResult<Json<Vec<String>>> {
    let domain: Domain = domain.parse()?;
    if !domain.requires_locale() {
        return Err(StoreError::LocaleNotAllowed(domain));
    }
    with_store(&state, move |store| store.list_categories(domain, Some(&locale)))
        .await
        .map(Json)
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.store.clear_cache();
    StatusCode::OK
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cached_documents: state.store.cached_documents(),
    })
}
