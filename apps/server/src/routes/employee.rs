//! Employee registration routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use boteco_core::{validation, Employee};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/employee/list", get(list))
        .route("/api/employee/create", post(create))
        .route(
            "/api/employee/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeRequest {
    nome: String,
    cargo: Option<String>,
    telefone: Option<String>,
    ativo: Option<bool>,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, ApiError> {
    Ok(Json(state.db.employees().list().await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Funcionário", &id))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<EmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let now = Utc::now();
    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        nome: req.nome.trim().to_string(),
        cargo: req.cargo,
        telefone: req.telefone,
        ativo: req.ativo.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.employees().insert(&employee).await?;
    Ok(Json(employee))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let existing = state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Funcionário", &id))?;

    let employee = Employee {
        id: existing.id,
        nome: req.nome.trim().to_string(),
        cargo: req.cargo,
        telefone: req.telefone,
        ativo: req.ativo.unwrap_or(existing.ativo),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.db.employees().update(&employee).await?;
    Ok(Json(employee))
}

/// Soft delete: sale attribution keeps resolving through the kept row.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.employees().deactivate(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
