//! Customer registration routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use boteco_core::{validation, Customer};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customer/list", get(list))
        .route("/api/customer/create", post(create))
        .route(
            "/api/customer/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRequest {
    nome: String,
    endereco: Option<String>,
    telefone: Option<String>,
    email: Option<String>,
    cpf: Option<String>,
    ativo: Option<bool>,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(state.db.customers().list().await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Cliente", &id))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        nome: req.nome.trim().to_string(),
        endereco: req.endereco,
        telefone: req.telefone,
        email: req.email,
        cpf: req.cpf,
        ativo: req.ativo.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.customers().insert(&customer).await?;
    Ok(Json(customer))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let existing = state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cliente", &id))?;

    let customer = Customer {
        id: existing.id,
        nome: req.nome.trim().to_string(),
        endereco: req.endereco,
        telefone: req.telefone,
        email: req.email,
        cpf: req.cpf,
        ativo: req.ativo.unwrap_or(existing.ativo),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.db.customers().update(&customer).await?;
    Ok(Json(customer))
}

/// Soft delete: the customer drops out of the registration screens but
/// stays resolvable for sale history.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.customers().deactivate(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
