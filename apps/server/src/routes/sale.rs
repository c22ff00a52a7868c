//! Sale routes: the PDV, comanda and checkout surface.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutation follows the same load → mutate → CAS-save shape:       │
//! │                                                                         │
//! │  1. load the sale (with its version) from boteco-db                    │
//! │  2. apply the operation in memory via boteco-core                      │
//! │     └── business rule violation? → 4xx, nothing written                │
//! │  3. save with compare-and-swap on the loaded version                   │
//! │     └── another terminal saved first? → 409, client reloads            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use boteco_core::{
    validation, Money, NewSale, Payment, PaymentMethod, Sale, SaleKind, SaleStatus,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sale/create", post(create))
        .route("/api/sale/list", get(list))
        .route("/api/sale/finalizadas", get(finalizadas))
        .route("/api/sale/{id}", get(get_by_id))
        .route("/api/sale/{id}/item", post(add_item).delete(remove_item))
        .route("/api/sale/{id}/item/{produto_id}", delete(remove_item_by_path))
        .route("/api/sale/{id}/save", put(save))
        .route("/api/sale/{id}/finalize", put(finalize))
        .route("/api/sale/{id}/cancel", put(cancel))
}

// =============================================================================
// Wire Types
// =============================================================================

/// Sale creation payload. The aliases cover the PDV's snake_case field
/// names (`tipo`, `funcionario_id`, `cliente_id`), which it posts
/// alongside client-computed totals that the server ignores and
/// recomputes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSaleRequest {
    #[serde(alias = "tipo", alias = "kind")]
    tipo_venda: SaleKind,
    mesa: Option<String>,
    #[serde(alias = "funcionario_id")]
    funcionario: Option<String>,
    #[serde(alias = "cliente_id")]
    cliente: Option<String>,
    nome_comanda: Option<String>,
    /// Discount percent (0-100), applied at settlement.
    #[serde(default)]
    desconto: f64,
    observacoes: Option<String>,
    /// The counter flow posts its whole cart at once. Each entry is
    /// resolved against the catalog for the name/price snapshot.
    #[serde(default)]
    itens: Vec<AddItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    #[serde(alias = "produto_id", alias = "produto")]
    produto_id: String,
    #[serde(default = "default_quantidade")]
    quantidade: i64,
}

fn default_quantidade() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveItemRequest {
    #[serde(alias = "produto_id", alias = "produto")]
    produto_id: String,
    /// Units to remove; the minus button sends no quantity and takes
    /// one unit off. The whole-line delete uses the path variant.
    #[serde(default = "default_quantidade")]
    quantidade: i64,
}

/// Checkout payload. An absent body settles as exact cash, which is how
/// the PDV finalizes counter sales without opening the Caixa dialog.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeRequest {
    forma_pagamento: Option<PaymentMethod>,
    valor_recebido: Option<Money>,
    /// Optional discount percent override, set by the Caixa screen.
    desconto: Option<f64>,
    observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    status: Option<SaleStatus>,
    tipo_venda: Option<SaleKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizadasQuery {
    data_inicio: Option<String>,
    data_fim: Option<String>,
}

fn percent_to_bps(percent: f64) -> u32 {
    (percent * 100.0).round() as u32
}

/// Accepts `2026-08-23` or a full RFC 3339 timestamp. Date-only values
/// cover the whole day: start-of-day for the lower bound, end-of-day
/// for the upper.
fn parse_date_param(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("invalid date: {}", value)))?;

    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    // and_hms_opt only fails for out-of-range components, which these are not
    time.map(|t| t.and_utc())
        .ok_or_else(|| ApiError::validation(format!("invalid date: {}", value)))
}

// =============================================================================
// Handlers
// =============================================================================

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let desconto_bps = percent_to_bps(req.desconto);
    validation::validate_desconto_bps(desconto_bps).map_err(boteco_core::CoreError::from)?;

    if req.tipo_venda == SaleKind::Mesa {
        let mesa_id = req
            .mesa
            .as_deref()
            .ok_or_else(|| ApiError::validation("venda de mesa requer o campo mesa"))?;
        state
            .db
            .mesas()
            .get_by_id(mesa_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Mesa", mesa_id))?;
    }

    let mut sale = Sale::new(
        NewSale {
            kind: req.tipo_venda,
            mesa: req.mesa.filter(|_| req.tipo_venda == SaleKind::Mesa),
            funcionario: req.funcionario.unwrap_or_else(|| "caixa".to_string()),
            cliente: req.cliente,
            nome_comanda: req.nome_comanda,
            desconto_bps,
            observacoes: req.observacoes,
        },
        now,
    )?;

    for item in &req.itens {
        let product = state
            .db
            .products()
            .get_by_id(&item.produto_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Produto", &item.produto_id))?;
        sale.add_item(&product, item.quantidade, now)?;
    }

    state.db.sales().insert(&sale).await?;

    tracing::info!(id = %sale.id, tipo = ?sale.kind, "Venda criada");
    Ok(Json(sale))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    load_sale(&state, &id).await.map(Json)
}

/// Lists sales with optional status/kind filters.
///
/// Comanda listings come back ordered by display name (tab name, else
/// customer name, else placeholder), the order the Comandas screen
/// presents them in.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let mut sales = state.db.sales().list(query.status, query.tipo_venda).await?;

    if query.tipo_venda == Some(SaleKind::Comanda) {
        let cliente_nomes = cliente_name_index(&state, &sales).await?;
        sales.sort_by_cached_key(|sale| {
            sale.display_name(
                sale.cliente
                    .as_deref()
                    .and_then(|c| cliente_nomes.get(c))
                    .map(String::as_str),
            )
            .to_lowercase()
        });
    }

    Ok(Json(sales))
}

/// Finalized sales within an optional settlement-date window (the
/// Caixa summary screen). Per-method totals are computed client-side.
async fn finalizadas(
    State(state): State<AppState>,
    Query(query): Query<FinalizadasQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let inicio = query
        .data_inicio
        .as_deref()
        .map(|v| parse_date_param(v, false))
        .transpose()?;
    let fim = query
        .data_fim
        .as_deref()
        .map(|v| parse_date_param(v, true))
        .transpose()?;

    Ok(Json(state.db.sales().list_finalizadas(inicio, fim).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    let product = state
        .db
        .products()
        .get_by_id(&req.produto_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Produto", &req.produto_id))?;

    sale.add_item(&product, req.quantidade, now)?;
    persist(&state, &mut sale).await?;

    Ok(Json(sale))
}

async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    sale.remove_item(&req.produto_id, Some(req.quantidade), now)?;
    persist(&state, &mut sale).await?;

    Ok(Json(sale))
}

/// The trash-can button: removes the whole line, no body needed.
async fn remove_item_by_path(
    State(state): State<AppState>,
    Path((id, produto_id)): Path<(String, String)>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    sale.remove_item(&produto_id, None, now)?;
    persist(&state, &mut sale).await?;

    Ok(Json(sale))
}

async fn save(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    sale.save(now)?;
    persist(&state, &mut sale).await?;

    tracing::debug!(id = %sale.id, "Venda salva");
    Ok(Json(sale))
}

async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<FinalizeRequest>>,
) -> Result<Json<Sale>, ApiError> {
    let Json(req) = body.unwrap_or_default();
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    if let Some(percent) = req.desconto {
        let bps = percent_to_bps(percent);
        validation::validate_desconto_bps(bps).map_err(boteco_core::CoreError::from)?;
        sale.desconto_bps = bps;
    }

    if let Some(obs) = req.observacoes {
        sale.observacoes = Some(obs);
    }

    let payment = match req.forma_pagamento.unwrap_or(PaymentMethod::Dinheiro) {
        PaymentMethod::Dinheiro => Payment::Cash {
            // Absent tendered amount means exact payment
            tendered: req.valor_recebido.unwrap_or_else(|| sale.total_with_discount()),
        },
        PaymentMethod::Cartao => Payment::Card,
        PaymentMethod::Pix => Payment::Pix,
    };

    sale.settle(payment, now)?;
    persist(&state, &mut sale).await?;

    tracing::info!(
        id = %sale.id,
        total = %sale.total,
        forma = ?sale.forma_pagamento,
        "Venda finalizada"
    );
    Ok(Json(sale))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let now = Utc::now();
    let mut sale = load_sale(&state, &id).await?;

    sale.cancel(now)?;
    persist(&state, &mut sale).await?;

    tracing::info!(id = %sale.id, "Venda cancelada");
    Ok(Json(sale))
}

// =============================================================================
// Internal
// =============================================================================

async fn load_sale(state: &AppState, id: &str) -> Result<Sale, ApiError> {
    state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venda", id))
}

/// CAS-saves the sale and reflects the bumped version in the response.
async fn persist(state: &AppState, sale: &mut Sale) -> Result<(), ApiError> {
    sale.version = state.db.sales().save(sale).await?;
    Ok(())
}

/// Resolves cliente ids to names for the comanda display-name sort,
/// one query for the whole listing.
async fn cliente_name_index(
    state: &AppState,
    sales: &[Sale],
) -> Result<HashMap<String, String>, ApiError> {
    if sales.iter().all(|s| s.cliente.is_none()) {
        return Ok(HashMap::new());
    }

    let customers = state.db.customers().list().await?;
    Ok(customers.into_iter().map(|c| (c.id, c.nome)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use boteco_core::Product;
    use boteco_db::{Database, DbConfig};
    use serde_json::json;

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, ServerConfig::load().unwrap())
    }

    fn chopp(id: &str) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            nome: "Chopp".into(),
            descricao: None,
            preco_custo: Money::from_centavos(400),
            preco_venda: Money::from_centavos(1050),
            grupo: None,
            unidade: None,
            estoque: 0,
            ativo: true,
            oculto: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_accepts_pdv_counter_cart() {
        let state = test_state().await;
        state.db.products().insert(&chopp("p1")).await.unwrap();

        // The PDV's literal payload: snake_case names plus
        // client-computed totals the server recomputes
        let req: CreateSaleRequest = serde_json::from_value(json!({
            "funcionario_id": "e1",
            "cliente_id": null,
            "tipo": "balcao",
            "desconto": 0,
            "total": 21.0,
            "itens": [{
                "produto_id": "p1",
                "quantidade": 2,
                "preco_unitario": 10.5,
                "subtotal": 21.0
            }]
        }))
        .unwrap();

        let Json(sale) = create(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(sale.kind, SaleKind::Balcao);
        assert_eq!(sale.funcionario, "e1");
        assert_eq!(sale.itens.len(), 1);
        assert_eq!(sale.itens[0].quantidade, 2);
        assert_eq!(sale.subtotal, Money::from_centavos(2100));

        // Snapshot comes from the catalog, not the client
        let stored = state.db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.itens[0].nome_produto, "Chopp");
        assert_eq!(stored.itens[0].preco_unitario, Money::from_centavos(1050));
    }

    #[tokio::test]
    async fn test_create_with_unknown_cart_product_is_not_found() {
        let state = test_state().await;

        let req: CreateSaleRequest = serde_json::from_value(json!({
            "tipo": "balcao",
            "itens": [{ "produto_id": "ghost", "quantidade": 1 }]
        }))
        .unwrap();

        let err = create(State(state.clone()), Json(req)).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
        // Nothing half-written
        assert!(state.db.sales().list(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_records_observacoes() {
        let state = test_state().await;
        state.db.products().insert(&chopp("p1")).await.unwrap();

        let req: CreateSaleRequest = serde_json::from_value(json!({
            "tipo": "balcao",
            "itens": [{ "produto_id": "p1", "quantidade": 1 }]
        }))
        .unwrap();
        let Json(sale) = create(State(state.clone()), Json(req)).await.unwrap();

        // The Caixa screen's payload, extra `troco` included
        let body: FinalizeRequest = serde_json::from_value(json!({
            "formaPagamento": "dinheiro",
            "valorRecebido": 20.0,
            "troco": 9.5,
            "observacoes": "pagou com nota de 20"
        }))
        .unwrap();

        let Json(done) = finalize(State(state), Path(sale.id), Some(Json(body)))
            .await
            .unwrap();
        assert_eq!(done.status, SaleStatus::Finalizada);
        assert_eq!(done.observacoes.as_deref(), Some("pagou com nota de 20"));
        assert_eq!(done.troco, Some(Money::from_centavos(950)));
    }
}
