//! Product group / unit of measure routes.
//!
//! One endpoint family manages both categories (`tipo=grupo`) and units
//! of measure (`tipo=unidade`), matching the management screen.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use boteco_core::{validation, ProductGroup, ProductGroupKind};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/product-group/list", get(list))
        .route("/api/product-group/create", post(create))
        .route("/api/product-group/update/{id}", put(update))
        .route("/api/product-group/delete/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    tipo: Option<ProductGroupKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupRequest {
    nome: String,
    descricao: Option<String>,
    icone: Option<String>,
    sigla: Option<String>,
    #[serde(default = "default_kind")]
    tipo: ProductGroupKind,
}

fn default_kind() -> ProductGroupKind {
    ProductGroupKind::Grupo
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductGroup>>, ApiError> {
    Ok(Json(state.db.groups().list(query.tipo).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<GroupRequest>,
) -> Result<Json<ProductGroup>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let now = Utc::now();
    let group = ProductGroup {
        id: Uuid::new_v4().to_string(),
        nome: req.nome.trim().to_string(),
        descricao: req.descricao,
        icone: req.icone,
        sigla: req.sigla,
        kind: req.tipo,
        ativo: true,
        created_at: now,
        updated_at: now,
    };

    state.db.groups().insert(&group).await?;
    Ok(Json(group))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<GroupRequest>,
) -> Result<Json<ProductGroup>, ApiError> {
    validation::validate_nome(&req.nome).map_err(boteco_core::CoreError::from)?;

    let existing = state
        .db
        .groups()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grupo", &id))?;

    // Kind is immutable after creation; the update endpoint only edits
    // the descriptive fields.
    let group = ProductGroup {
        id: existing.id,
        nome: req.nome.trim().to_string(),
        descricao: req.descricao,
        icone: req.icone,
        sigla: req.sigla,
        kind: existing.kind,
        ativo: existing.ativo,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.db.groups().update(&group).await?;
    Ok(Json(group))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.groups().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
