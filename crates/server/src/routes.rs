//! HTTP gateway.
//!
//! ```text
//! GET  /{collection}/{id}            fetch a record
//! POST /{collection}/{id|new}        update or create
//! GET  /accounts/{id}/visits         filtered visit listing
//! GET  /places/{id}/avg              filtered average mark
//! ```
//!
//! `users` and `locations` are accepted for `accounts` and `places`.
//! Anything else is answered with an empty 404.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use roamdb_core::{EntityKind, RoamError};
use roamdb_engine::{AccountVisit, AverageFilter, Store, VisitFilter};
use serde::Serialize;

use crate::codec::{average_body, decode_patch, write_ack};
use crate::error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The store every request works on
    pub store: Arc<Store>,
}

impl AppState {
    /// Wrap a store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

/// Entity collection named by the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// `/accounts` or `/users`
    Accounts,
    /// `/places` or `/locations`
    Places,
    /// `/visits`
    Visits,
}

impl Collection {
    /// Resolve a path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "accounts" | "users" => Some(Collection::Accounts),
            "places" | "locations" => Some(Collection::Places),
            "visits" => Some(Collection::Visits),
            _ => None,
        }
    }

    fn entity(&self) -> EntityKind {
        match self {
            Collection::Accounts => EntityKind::Account,
            Collection::Places => EntityKind::Place,
            Collection::Visits => EntityKind::Visit,
        }
    }
}

#[derive(Serialize)]
struct VisitListing {
    visits: Vec<AccountVisit>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/:collection/:id",
            get(fetch).post(write).fallback(no_route),
        )
        .route("/:collection/:id/:sub", get(sub_resource).fallback(no_route))
        .fallback(no_route)
        .with_state(state)
}

async fn no_route(uri: Uri) -> ApiError {
    ApiError::NoRoute(uri.path().to_string())
}

fn collection(segment: &str, uri: &Uri) -> ApiResult<Collection> {
    Collection::from_segment(segment).ok_or_else(|| ApiError::NoRoute(uri.path().to_string()))
}

/// Ids are plain unsigned integers; anything else names no record.
fn record_id(segment: &str, uri: &Uri) -> ApiResult<u32> {
    segment
        .parse()
        .map_err(|_| ApiError::NoRoute(uri.path().to_string()))
}

fn ensure_exists(store: &Store, collection: Collection, id: u32) -> ApiResult<()> {
    let exists = match collection {
        Collection::Accounts => store.contains_account(id),
        Collection::Places => store.contains_place(id),
        Collection::Visits => store.contains_visit(id),
    };
    if !exists {
        return Err(RoamError::not_found(collection.entity(), id).into());
    }
    Ok(())
}

async fn fetch(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult<Response> {
    let Path((segment, id)) = path.map_err(|_| ApiError::NoRoute(uri.path().to_string()))?;
    let collection = collection(&segment, &uri)?;
    let id = record_id(&id, &uri)?;
    let store = &state.store;
    let response = match collection {
        Collection::Accounts => Json(store.account(id)?).into_response(),
        Collection::Places => Json(store.place(id)?).into_response(),
        Collection::Visits => Json(store.visit(id)?).into_response(),
    };
    Ok(response)
}

async fn write(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Bytes,
) -> ApiResult<Response> {
    let Path((segment, id)) = path.map_err(|_| ApiError::NoRoute(uri.path().to_string()))?;
    let collection = collection(&segment, &uri)?;
    let store = &state.store;

    if id == "new" {
        match collection {
            Collection::Accounts => store.new_account(decode_patch(&body)?)?,
            Collection::Places => store.new_place(decode_patch(&body)?)?,
            Collection::Visits => store.new_visit(decode_patch(&body)?)?,
        }
        return Ok(write_ack());
    }

    let id = record_id(&id, &uri)?;
    ensure_exists(store, collection, id)?;
    match collection {
        Collection::Accounts => store.update_account(id, &decode_patch(&body)?)?,
        Collection::Places => store.update_place(id, &decode_patch(&body)?)?,
        Collection::Visits => store.update_visit(id, &decode_patch(&body)?)?,
    }
    Ok(write_ack())
}

async fn sub_resource(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<(String, String, String)>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Response> {
    let Path((segment, id, sub)) = path.map_err(|_| ApiError::NoRoute(uri.path().to_string()))?;
    let collection = collection(&segment, &uri)?;
    let id = record_id(&id, &uri)?;
    let store = &state.store;

    match (collection, sub.as_str()) {
        (Collection::Accounts, "visits") | (Collection::Places, "avg") => {}
        _ => return Err(ApiError::NoRoute(uri.path().to_string())),
    }
    ensure_exists(store, collection, id)?;
    let Query(params) = query.map_err(|e| RoamError::malformed(e.body_text()))?;

    if collection == Collection::Accounts {
        let filter = VisitFilter::from_params(&params)?;
        let visits = store.visits_for_account(id, &filter)?;
        Ok(Json(VisitListing { visits }).into_response())
    } else {
        let filter = AverageFilter::from_params(&params)?;
        Ok(average_body(store.average_mark(id, &filter)?))
    }
}
