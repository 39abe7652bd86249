//! Task CRUD handlers
//!
//! Each handler is one store call, at most one broadcast, one response.
//! Broadcasts are fire-and-forget; the HTTP response does not depend on
//! delivery.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_types::{ServerMessage, Task, DEFAULT_STATUS};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    name: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    message: String,
    #[serde(rename = "taskId")]
    task_id: i64,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let status = req.status.unwrap_or_else(|| DEFAULT_STATUS.to_string());

    // A missing name is passed to the store as-is; the store rejects it.
    let task_id = state.db.create_task(req.name.as_deref(), &status).await?;

    state
        .hub
        .broadcast(ServerMessage::TaskCreated {
            message: "Task created successfully".to_string(),
            task_id,
            name: req.name.unwrap_or_default(),
            status,
            created_at: Utc::now(),
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            message: "Task created successfully".to_string(),
            task_id,
        }),
    ))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.db.list_tasks().await?;
    Ok(Json(tasks))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    match state.db.get_task(id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::NotFound),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    name: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateTaskResponse {
    id: i64,
    name: String,
    status: String,
    created_at: DateTime<Utc>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<UpdateTaskResponse>, ApiError> {
    // Missing fields are passed to the store as-is; the store rejects them.
    let updated = state
        .db
        .update_task(id, req.name.as_deref(), req.status.as_deref())
        .await?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    // A successful update implies both fields were present.
    let name = req.name.unwrap_or_default();
    let status = req.status.unwrap_or_default();

    // Echoes the client-supplied values with a fresh timestamp instead of
    // re-reading the store; a store-side default or trigger would not be
    // reflected here.
    let created_at = Utc::now();

    state
        .hub
        .broadcast(ServerMessage::TaskUpdated {
            message: "Task updated successfully".to_string(),
            id,
            name: name.clone(),
            status: status.clone(),
            created_at,
        })
        .await;

    Ok(Json(UpdateTaskResponse {
        id,
        name,
        status,
        created_at,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    message: String,
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteTaskResponse>, ApiError> {
    let deleted = state.db.delete_task(id).await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    state
        .hub
        .broadcast(ServerMessage::TaskDeleted {
            message: "Task deleted successfully".to_string(),
            task_id: id,
        })
        .await;

    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
