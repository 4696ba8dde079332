//! API Handlers
//!
//! HTTP request handlers for each herd cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::herd::{HerdCache, HerdSettings, PrefixKeyMaker};
use crate::models::{
    AddResponse, DeleteResponse, GetManyRequest, GetManyResponse, GetResponse, HealthResponse,
    SetManyRequest, SetManyResponse, SetRequest, SetResponse, StatsResponse, VersionQuery,
};
use crate::store::MemoryStore;

/// Application state shared across all handlers.
///
/// The herd cache is stateless apart from its store handle, so no lock is
/// needed at this level; the memory store synchronizes internally.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<HerdCache<MemoryStore>>,
}

impl AppState {
    /// Creates a new AppState over the given store with default key naming.
    pub fn new(store: MemoryStore, settings: HerdSettings) -> Self {
        Self {
            cache: Arc::new(HerdCache::new(store, PrefixKeyMaker::default(), settings)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = MemoryStore::new(config.max_entries, config.default_timeout);
        let keys = PrefixKeyMaker::new(config.key_prefix.clone(), config.key_version);

        Self {
            cache: Arc::new(HerdCache::new(store, keys, config.herd_settings())),
        }
    }

    /// Handle to the backing store, shared with background tasks.
    pub fn store(&self) -> MemoryStore {
        self.cache.store().clone()
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .set(&req.key, req.value.as_bytes(), req.timeout, req.version, req.herd)
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for PUT /add
///
/// Fails with 409 when the key already holds a value.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<AddResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let added = state
        .cache
        .add(&req.key, req.value.as_bytes(), req.timeout, req.version, req.herd)
        .await?;
    if !added {
        return Err(CacheError::Conflict(req.key));
    }

    Ok(Json(AddResponse {
        key: req.key,
        added,
    }))
}

/// Handler for GET /get/:key
///
/// Both a store miss and a herd refresh answer 404; on the latter the caller
/// is expected to recompute the value and PUT it back.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key, query.version).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => {
            debug!("Miss for {}", key);
            Err(CacheError::NotFound(key))
        }
    }
}

/// Handler for POST /get_many
pub async fn get_many_handler(
    State(state): State<AppState>,
    Json(req): Json<GetManyRequest>,
) -> Result<Json<GetManyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let values = state.cache.get_many(&req.keys, req.version).await?;

    Ok(Json(GetManyResponse::new(values)))
}

/// Handler for PUT /set_many
pub async fn set_many_handler(
    State(state): State<AppState>,
    Json(req): Json<SetManyRequest>,
) -> Result<Json<SetManyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let (timeout, version, herd) = (req.timeout, req.version, req.herd);
    let data = req.into_bytes();
    state.cache.set_many(&data, timeout, version, herd).await?;

    Ok(Json(SetManyResponse::new(data.len())))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key, query.version).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.store().stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
