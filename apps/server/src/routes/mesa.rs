//! Mesa (table) routes.
//!
//! ## Occupancy
//! The floor view shows each mesa with its *effective* status: the
//! stored base status overridden by `ocupada` whenever an open sale
//! references the mesa. Opening a mesa creates the mesa-bound sale;
//! closing it cancels the open sale. There is no stored occupancy flag
//! to drift out of sync.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boteco_core::{
    validation, Mesa, MesaKind, MesaStatus, NewSale, Sale, SaleKind,
};

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/mesa/list", get(list))
        .route("/api/mesa/create", post(create))
        .route("/api/mesa/{id}", get(get_by_id))
        .route("/api/mesa/{id}/abrir", post(abrir))
        .route("/api/mesa/{id}/fechar", post(fechar))
}

// =============================================================================
// Wire Types
// =============================================================================

/// A mesa as the floor view consumes it: stored fields plus the derived
/// occupancy facts (current sale, opening time, minutes occupied).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MesaView {
    #[serde(rename = "_id")]
    id: String,
    numero: String,
    nome: String,
    capacidade: i64,
    #[serde(rename = "tipo")]
    kind: MesaKind,
    /// Effective status: `ocupada` wins whenever an open sale exists.
    status: MesaStatus,
    observacoes: Option<String>,
    venda_atual: Option<Sale>,
    hora_abertura: Option<DateTime<Utc>>,
    /// Minutes since the open sale was created.
    tempo_ocupacao: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MesaView {
    fn build(mesa: Mesa, venda_atual: Option<Sale>, now: DateTime<Utc>) -> Self {
        let status = MesaStatus::effective(mesa.status, venda_atual.is_some());
        let hora_abertura = venda_atual.as_ref().map(|s| s.created_at);
        let tempo_ocupacao = hora_abertura.map(|t| (now - t).num_minutes().max(0));

        MesaView {
            id: mesa.id,
            numero: mesa.numero,
            nome: mesa.nome,
            capacidade: mesa.capacidade,
            kind: mesa.kind,
            status,
            observacoes: mesa.observacoes,
            venda_atual,
            hora_abertura,
            tempo_ocupacao,
            created_at: mesa.created_at,
            updated_at: mesa.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMesaRequest {
    numero: String,
    nome: Option<String>,
    capacidade: Option<i64>,
    #[serde(default = "default_kind")]
    tipo: MesaKind,
    observacoes: Option<String>,
}

fn default_kind() -> MesaKind {
    MesaKind::Interna
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbrirMesaRequest {
    funcionario: Option<String>,
    cliente: Option<String>,
    nome_comanda: Option<String>,
    observacoes: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(State(state): State<AppState>) -> Result<Json<Vec<MesaView>>, ApiError> {
    let now = Utc::now();
    let mesas = state.db.mesas().list().await?;
    let occupied = state.db.mesas().occupied_mesa_ids().await?;

    let mut views = Vec::with_capacity(mesas.len());
    for mesa in mesas {
        let venda_atual = if occupied.contains(&mesa.id) {
            state.db.sales().open_sale_for_mesa(&mesa.id).await?
        } else {
            None
        };
        views.push(MesaView::build(mesa, venda_atual, now));
    }

    Ok(Json(views))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MesaView>, ApiError> {
    let mesa = state
        .db
        .mesas()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Mesa", &id))?;

    let venda_atual = state.db.sales().open_sale_for_mesa(&id).await?;
    Ok(Json(MesaView::build(mesa, venda_atual, Utc::now())))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateMesaRequest>,
) -> Result<Json<MesaView>, ApiError> {
    validation::validate_mesa_numero(&req.numero).map_err(boteco_core::CoreError::from)?;
    let capacidade = req.capacidade.unwrap_or(4);
    validation::validate_capacidade(capacidade).map_err(boteco_core::CoreError::from)?;

    let now = Utc::now();
    let numero = req.numero.trim().to_string();
    let mesa = Mesa {
        id: Uuid::new_v4().to_string(),
        nome: req.nome.unwrap_or_else(|| format!("Mesa {}", numero)),
        numero,
        capacidade,
        kind: req.tipo,
        status: MesaStatus::Livre,
        observacoes: req.observacoes,
        created_at: now,
        updated_at: now,
    };

    state.db.mesas().insert(&mesa).await?;
    Ok(Json(MesaView::build(mesa, None, now)))
}

/// Opens the mesa: creates its mesa-bound sale in status `aberta`.
///
/// Opening an occupied mesa loses the insert race and surfaces as 409;
/// a mesa under maintenance refuses to open.
async fn abrir(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<AbrirMesaRequest>>,
) -> Result<Json<MesaView>, ApiError> {
    let Json(req) = body.unwrap_or_default();
    let now = Utc::now();

    let mesa = state
        .db
        .mesas()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Mesa", &id))?;

    if mesa.status == MesaStatus::Manutencao {
        return Err(ApiError::new(
            axum::http::StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidState,
            format!("mesa {} está em manutenção", mesa.numero),
        ));
    }

    let sale = Sale::new(
        NewSale {
            kind: SaleKind::Mesa,
            mesa: Some(mesa.id.clone()),
            funcionario: req.funcionario.unwrap_or_else(|| "caixa".to_string()),
            cliente: req.cliente,
            nome_comanda: req.nome_comanda,
            desconto_bps: 0,
            observacoes: req.observacoes,
        },
        now,
    )?;

    // The guarded insert is the occupancy check; no status column races
    state.db.sales().insert(&sale).await?;

    tracing::info!(mesa = %mesa.numero, sale = %sale.id, "Mesa aberta");
    Ok(Json(MesaView::build(mesa, Some(sale), now)))
}

/// Closes the mesa: cancels its open sale, if any.
///
/// Idempotent; closing an already-free mesa is a no-op. A sale with
/// items that should be charged goes through checkout instead.
async fn fechar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MesaView>, ApiError> {
    let now = Utc::now();

    let mesa = state
        .db
        .mesas()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Mesa", &id))?;

    if let Some(mut sale) = state.db.sales().open_sale_for_mesa(&id).await? {
        sale.cancel(now)?;
        state.db.sales().save(&sale).await?;
        tracing::info!(mesa = %mesa.numero, sale = %sale.id, "Mesa fechada, venda cancelada");
    }

    Ok(Json(MesaView::build(mesa, None, now)))
}
