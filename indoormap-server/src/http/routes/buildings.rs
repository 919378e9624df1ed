//! Building endpoints
//!
//! Thin pass-through to the document store. Every success body is
//! `{msg, data}` except the plain list and single-document reads.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidUuid};
use crate::models::{Building, BuildingDoc};
use crate::state::AppState;

const NOT_FOUND_MSG: &str = "building of that id was not found (404)";

/// Success envelope
#[derive(Serialize)]
pub struct BuildingEnvelope<T> {
    pub msg: &'static str,
    pub data: T,
}

/// Not-found envelope echoing the requested id
#[derive(Serialize)]
pub struct BuildingNotFound {
    pub msg: &'static str,
    pub id: Uuid,
}

fn not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(BuildingNotFound {
            msg: NOT_FOUND_MSG,
            id,
        }),
    )
        .into_response()
}

/// GET /app/building/all
async fn list_buildings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Building>>, ApiError> {
    Ok(Json(state.buildings.list().await?))
}

/// GET /app/building/{id}
async fn get_building(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Response, ApiError> {
    Ok(match state.buildings.get(id).await? {
        Some(building) => Json(building).into_response(),
        None => not_found(id),
    })
}

/// POST /app/building/add
async fn add_building(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<BuildingEnvelope<Building>>, ApiError> {
    let doc = BuildingDoc::new(body)?;
    let building = state.buildings.create(doc).await?;

    Ok(Json(BuildingEnvelope {
        msg: "successfully added building",
        data: building,
    }))
}

/// POST /app/building/add/multiple
async fn add_buildings(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Vec<Value>>,
) -> Result<Json<BuildingEnvelope<Vec<Building>>>, ApiError> {
    let docs = BuildingDoc::batch(body)?;
    let buildings = state.buildings.create_many(docs).await?;
    tracing::info!(count = buildings.len(), "buildings added");

    Ok(Json(BuildingEnvelope {
        msg: "successfully added multiple buildings",
        data: buildings,
    }))
}

/// PATCH /app/building/update/{id}
///
/// A missing id answers 200 with `data: null`.
async fn update_building(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<BuildingEnvelope<Option<Building>>>, ApiError> {
    let patch = BuildingDoc::new(body)?;
    let building = state.buildings.update(id, patch).await?;

    Ok(Json(BuildingEnvelope {
        msg: "successfully updated building",
        data: building,
    }))
}

/// DELETE /app/building/delete/{id}
async fn delete_building(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Response, ApiError> {
    Ok(match state.buildings.delete(id).await? {
        Some(building) => Json(BuildingEnvelope {
            msg: "successfully deleted building",
            data: building,
        })
        .into_response(),
        None => not_found(id),
    })
}

/// Building routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/app/building/all", get(list_buildings))
        .route("/app/building/{id}", get(get_building))
        .route("/app/building/add", post(add_building))
        .route("/app/building/add/multiple", post(add_buildings))
        .route("/app/building/update/{id}", patch(update_building))
        .route("/app/building/delete/{id}", delete(delete_building))
}
