//! Indoor issue endpoints
//!
//! Issue creation takes a multipart form: text fields named like the JSON
//! attributes plus an optional `image` file.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, IssueId};
use crate::models::{
    CategoryFilter, CategoryFilterRequest, ImageUpload, Issue, IssuePatch, NewIssue,
    ValidationError,
};
use crate::state::AppState;

/// Multipart field carrying the image file
pub const IMAGE_FIELD: &str = "image";

const NOT_FOUND_MSG: &str = "Indoor issue not found";

/// Success envelope
#[derive(Serialize)]
pub struct IssueEnvelope {
    pub message: &'static str,
    pub data: Issue,
}

/// Not-found envelope
#[derive(Serialize)]
pub struct IssueNotFound {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

fn not_found(id: Option<i32>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(IssueNotFound {
            message: NOT_FOUND_MSG,
            id,
        }),
    )
        .into_response()
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::from_rejection(e.status(), e.body_text())
}

/// Split a multipart form into text fields and the optional image.
///
/// Only a file part named `image` is the upload. A plain text `image`
/// field is kept with the other text fields and ignored.
async fn read_issue_form(
    mut multipart: Multipart,
) -> Result<(NewIssue, Option<ImageUpload>), ApiError> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == IMAGE_FIELD && field.file_name().is_some() {
            let bytes = field.bytes().await.map_err(multipart_error)?;
            image = ImageUpload::new(bytes.to_vec());
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }

    Ok((NewIssue::from_form(&fields)?, image))
}

/// GET /app/indoorIssue/all
async fn list_issues(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Issue>>, ApiError> {
    Ok(Json(state.issues.list().await?))
}

/// POST /app/indoorIssue/filtered
async fn filtered_issues(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CategoryFilterRequest>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let filter = CategoryFilter::try_from(req)?;
    Ok(Json(state.issues.list_by_categories(&filter).await?))
}

/// GET /app/indoorIssue/{id}
async fn get_issue(
    State(state): State<Arc<AppState>>,
    IssueId(id): IssueId,
) -> Result<Response, ApiError> {
    Ok(match state.issues.get(id).await? {
        Some(issue) => Json(issue).into_response(),
        None => (StatusCode::NOT_FOUND, "Issue not found").into_response(),
    })
}

/// POST /app/indoorIssue/add
async fn add_issue(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IssueEnvelope>, ApiError> {
    let multipart =
        multipart.map_err(|r| ApiError::from_rejection(r.status(), r.body_text()))?;
    let (issue, image) = read_issue_form(multipart).await?;

    let created = state.issues.create(issue, image).await?;

    Ok(Json(IssueEnvelope {
        message: "Successfully added indoor issue",
        data: created,
    }))
}

/// PATCH /app/indoorIssue/update/{id}
async fn update_issue(
    State(state): State<Arc<AppState>>,
    IssueId(id): IssueId,
    ApiJson(patch): ApiJson<IssuePatch>,
) -> Result<Response, ApiError> {
    if patch.is_empty() {
        return Err(ValidationError::Empty {
            field: "update attributes",
        }
        .into());
    }

    Ok(match state.issues.update(id, &patch).await? {
        Some(issue) => Json(IssueEnvelope {
            message: "Successfully updated indoor issue",
            data: issue,
        })
        .into_response(),
        None => not_found(None),
    })
}

/// DELETE /app/indoorIssue/delete/{id}
async fn delete_issue(
    State(state): State<Arc<AppState>>,
    IssueId(id): IssueId,
) -> Result<Response, ApiError> {
    Ok(match state.issues.delete(id).await? {
        Some(issue) => Json(IssueEnvelope {
            message: "Successfully deleted indoor issue",
            data: issue,
        })
        .into_response(),
        None => not_found(Some(id)),
    })
}

/// Indoor issue routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/app/indoorIssue/all", get(list_issues))
        .route("/app/indoorIssue/filtered", post(filtered_issues))
        .route("/app/indoorIssue/{id}", get(get_issue))
        .route("/app/indoorIssue/add", post(add_issue))
        .route("/app/indoorIssue/update/{id}", patch(update_issue))
        .route("/app/indoorIssue/delete/{id}", delete(delete_issue))
}
