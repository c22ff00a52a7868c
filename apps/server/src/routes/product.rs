//! Product catalog routes.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use boteco_core::{validation, CoreError, Money, Product};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/product/list", get(list))
        .route("/api/product/create", post(create))
        .route("/api/product/update/{id}", put(update))
        .route("/api/product/{id}", get(get_by_id).put(update).delete(remove))
}

/// The registration form's payload. `precoVenda` on input, `preco` on
/// output (the Product serializer handles the output side).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRequest {
    nome: String,
    descricao: Option<String>,
    #[serde(default)]
    preco_custo: Money,
    #[serde(alias = "preco")]
    preco_venda: Money,
    grupo: Option<String>,
    unidade: Option<String>,
    #[serde(default)]
    estoque: i64,
    #[serde(default)]
    oculto: bool,
    ativo: Option<bool>,
}

impl ProductRequest {
    fn validate(&self) -> Result<(), CoreError> {
        validation::validate_nome(&self.nome)?;
        validation::validate_preco(self.preco_venda)?;
        validation::validate_preco(self.preco_custo)?;
        Ok(())
    }
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.db.products().list().await?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Produto", &id))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        nome: req.nome.trim().to_string(),
        descricao: req.descricao,
        preco_custo: req.preco_custo,
        preco_venda: req.preco_venda,
        grupo: req.grupo,
        unidade: req.unidade,
        estoque: req.estoque,
        ativo: req.ativo.unwrap_or(true),
        oculto: req.oculto,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;
    Ok(Json(product))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;

    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Produto", &id))?;

    let product = Product {
        id: existing.id,
        nome: req.nome.trim().to_string(),
        descricao: req.descricao,
        preco_custo: req.preco_custo,
        preco_venda: req.preco_venda,
        grupo: req.grupo,
        unidade: req.unidade,
        estoque: req.estoque,
        ativo: req.ativo.unwrap_or(existing.ativo),
        oculto: req.oculto,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    state.db.products().update(&product).await?;
    Ok(Json(product))
}

/// Soft delete: drops the product from the catalog; line-item
/// snapshots in past sales are unaffected.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.products().deactivate(&id).await?;
    Ok(Json(json!({ "deleted": id })))
}
