//! # Sale Aggregate & Lifecycle
//!
//! The central aggregate of Boteco POS: one customer transaction
//! ("venda"), whether counter, mesa-bound, comanda (tab) or delivery.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Sale State Machine                            │
//! │                                                                     │
//! │              save                     checkout (settle)             │
//! │   ┌────────┐ ───► ┌────────┐  ─────────────────────►  ┌──────────┐  │
//! │   │ aberta │      │ salva  │   precondition: ≥1 item  │finalizada│  │
//! │   └────────┘ ◄─── └────────┘        + payment         └──────────┘  │
//! │        │      edit     │                                (terminal)  │
//! │        │               │    cancel                                  │
//! │        └───────────────┴──────────────►  ┌───────────┐              │
//! │                                          │ cancelada │ (terminal)   │
//! │                                          └───────────┘              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Total Formula
//! Every presentation surface (PDV, Mesas, Comandas, Caixa) used to
//! recompute totals with its own copy of the arithmetic and they had
//! drifted apart. This module is now the only place where totals are
//! computed:
//!
//! - `subtotal` always equals the sum of line subtotals, recomputed
//!   atomically with every item mutation.
//! - the percentage discount is applied exactly once, at settlement;
//!   the stored subtotal is never mutated by it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_desconto_bps, validate_quantidade, validate_sale_size};

// =============================================================================
// Status / Kind / Payment Enums
// =============================================================================

/// The kind of sale. Wire values match the frontend's `tipoVenda`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleKind {
    /// Counter sale, rung up and settled at the PDV.
    Balcao,
    /// Bound to a physical mesa; occupies it while open.
    Mesa,
    /// Named tab with no mesa reference.
    Comanda,
    Delivery,
}

/// Sale status as a closed variant set.
///
/// The original stored these as loose strings (`status === 'aberta'`)
/// and trusted caller discipline; here illegal transitions are rejected
/// by [`Sale::set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// In progress, items being added.
    Aberta,
    /// Checkpointed. No semantic effect; further edits re-enter `Aberta`.
    Salva,
    /// Paid and closed through checkout. Terminal.
    Finalizada,
    /// Discarded without a settlement record. Terminal.
    Cancelada,
}

impl SaleStatus {
    /// Terminal sales are immutable.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Finalizada | SaleStatus::Cancelada)
    }

    /// Whether item mutations are accepted in this status.
    #[inline]
    pub const fn is_editable(&self) -> bool {
        matches!(self, SaleStatus::Aberta | SaleStatus::Salva)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Aberta
    }
}

/// Payment method recorded on a finalized sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Dinheiro,
    Cartao,
    Pix,
}

/// Settlement input as a tagged variant.
///
/// Only cash carries a tendered amount; card and pix are always exact.
/// Modeling this as data (instead of method + conditionally-required
/// fields) makes the "tendered is ignored for card/pix" rule structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payment {
    Cash { tendered: Money },
    Card,
    Pix,
}

impl Payment {
    /// The method recorded on the sale for this payment.
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Payment::Cash { .. } => PaymentMethod::Dinheiro,
            Payment::Card => PaymentMethod::Cartao,
            Payment::Pix => PaymentMethod::Pix,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: `nome_produto` and `preco_unitario` are
/// frozen at add time so the sale history survives later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Product id reference.
    pub produto: String,

    /// Product name at time of adding (frozen).
    pub nome_produto: String,

    /// Unit price at time of adding (frozen).
    pub preco_unitario: Money,

    /// Always >= 1; a decrement to zero deletes the line instead.
    pub quantidade: i64,

    /// preco_unitario × quantidade.
    pub subtotal: Money,
}

impl SaleItem {
    fn from_product(product: &Product, quantidade: i64) -> Self {
        SaleItem {
            produto: product.id.clone(),
            nome_produto: product.nome.clone(),
            preco_unitario: product.preco_venda,
            quantidade,
            subtotal: product.preco_venda.multiply_quantity(quantidade),
        }
    }

    fn recompute_subtotal(&mut self) {
        self.subtotal = self.preco_unitario.multiply_quantity(self.quantidade);
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Parameters for opening a new sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub kind: SaleKind,
    /// Present iff kind == Mesa.
    pub mesa: Option<String>,
    /// Employee operating the sale.
    pub funcionario: String,
    pub cliente: Option<String>,
    /// Tab display name (comandas).
    pub nome_comanda: Option<String>,
    /// Discount percentage in basis points, applied at settlement only.
    pub desconto_bps: u32,
    pub observacoes: Option<String>,
}

/// One customer transaction and its items, totals and payment record.
///
/// ## Invariants
/// - `subtotal == Σ item.subtotal` after every operation
/// - items are unique by product id (adding merges quantities)
/// - a finalized or cancelled sale accepts no further mutation
/// - `total` carries the settlement total (discount applied) once the
///   sale is finalized; before that it mirrors `subtotal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(rename = "_id")]
    pub id: String,

    /// Short human-readable number shown on the PDV header.
    pub numero_comanda: String,

    #[serde(rename = "tipoVenda")]
    pub kind: SaleKind,

    /// Mesa id, present iff kind == Mesa.
    pub mesa: Option<String>,

    pub funcionario: String,
    pub cliente: Option<String>,
    pub nome_comanda: Option<String>,

    pub itens: Vec<SaleItem>,

    /// Sum of line subtotals. Never includes the discount.
    pub subtotal: Money,

    /// Discount percentage (0-100 on the wire, basis points in memory).
    #[serde(rename = "desconto", with = "desconto_wire")]
    pub desconto_bps: u32,

    /// Settlement total. Mirrors `subtotal` until finalized.
    pub total: Money,

    pub status: SaleStatus,
    pub observacoes: Option<String>,

    // Present on finalized sales only
    pub forma_pagamento: Option<PaymentMethod>,
    pub valor_recebido: Option<Money>,
    pub troco: Option<Money>,
    pub finalizada_em: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped on every persisted write.
    pub version: i64,
}

impl Sale {
    /// Opens a new sale in status `aberta`.
    pub fn new(params: NewSale, now: DateTime<Utc>) -> CoreResult<Self> {
        validate_desconto_bps(params.desconto_bps)?;

        let id = Uuid::new_v4().to_string();
        let numero_comanda = generate_numero_comanda(&id, now);

        Ok(Sale {
            id,
            numero_comanda,
            kind: params.kind,
            mesa: params.mesa,
            funcionario: params.funcionario,
            cliente: params.cliente,
            nome_comanda: params.nome_comanda,
            itens: Vec::new(),
            subtotal: Money::zero(),
            desconto_bps: params.desconto_bps,
            total: Money::zero(),
            status: SaleStatus::Aberta,
            observacoes: params.observacoes,
            forma_pagamento: None,
            valor_recebido: None,
            troco: None,
            finalizada_em: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Number of unique line items.
    pub fn item_count(&self) -> usize {
        self.itens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itens.is_empty()
    }

    /// The amount the customer owes: subtotal with the percentage
    /// discount applied, rounded half-up. This is the ONLY place the
    /// discount enters a total.
    pub fn total_with_discount(&self) -> Money {
        self.subtotal.apply_percentage_discount(self.desconto_bps)
    }

    /// Display name used to order comandas in list views: explicit tab
    /// name, else the customer's name, else a placeholder. Ordering by
    /// this name is purely presentational but must be deterministic.
    pub fn display_name(&self, cliente_nome: Option<&str>) -> String {
        self.nome_comanda
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(cliente_nome)
            .unwrap_or("Sem nome")
            .to_string()
    }

    // -------------------------------------------------------------------------
    // Item Mutations
    // -------------------------------------------------------------------------

    /// Adds `quantidade` units of a product.
    ///
    /// If a line for the product already exists its quantity is
    /// incremented; otherwise a new line is appended with a name/price
    /// snapshot taken from the product now. Totals are recomputed in the
    /// same call; there is no state where items and totals disagree.
    ///
    /// Editing a `salva` sale silently re-enters `aberta` (save is a
    /// checkpoint, not a lock).
    pub fn add_item(&mut self, product: &Product, quantidade: i64, now: DateTime<Utc>) -> CoreResult<()> {
        validate_quantidade(quantidade)?;
        self.ensure_editable("add item")?;

        if let Some(item) = self.itens.iter_mut().find(|i| i.produto == product.id) {
            item.quantidade += quantidade;
            item.recompute_subtotal();
        } else {
            validate_sale_size(self.itens.len())?;
            self.itens.push(SaleItem::from_product(product, quantidade));
        }

        self.reopen_if_saved();
        self.recompute_totals();
        self.updated_at = now;
        Ok(())
    }

    /// Removes units of a product from the sale.
    ///
    /// `quantidade = None` removes the whole line (the trash-can button);
    /// `Some(n)` decrements, deleting the line when the remaining
    /// quantity would be zero or negative. Fails with `NotFound` when no
    /// line matches, leaving the sale untouched.
    pub fn remove_item(
        &mut self,
        produto_id: &str,
        quantidade: Option<i64>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ensure_editable("remove item")?;

        let index = self
            .itens
            .iter()
            .position(|i| i.produto == produto_id)
            .ok_or_else(|| CoreError::not_found("Item", produto_id))?;

        match quantidade {
            Some(qty) if qty < self.itens[index].quantidade => {
                let item = &mut self.itens[index];
                item.quantidade -= qty;
                item.recompute_subtotal();
            }
            // Removing >= the present quantity floors at zero: drop the line
            _ => {
                self.itens.remove(index);
            }
        }

        self.reopen_if_saved();
        self.recompute_totals();
        self.updated_at = now;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Status Transitions
    // -------------------------------------------------------------------------

    /// Applies one transition from the state machine table.
    ///
    /// `finalizada` is reachable only through [`Sale::settle`] because it
    /// requires a captured payment; asking for it here is an illegal
    /// transition even from an editable status.
    pub fn set_status(&mut self, new: SaleStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::InvalidState {
                status: self.status,
                operation: "change status",
            });
        }

        let allowed = matches!(
            (self.status, new),
            (SaleStatus::Aberta, SaleStatus::Salva)
                | (SaleStatus::Salva, SaleStatus::Aberta)
                | (SaleStatus::Salva, SaleStatus::Salva)
                | (SaleStatus::Aberta, SaleStatus::Cancelada)
                | (SaleStatus::Salva, SaleStatus::Cancelada)
        );

        if !allowed {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: new,
            });
        }

        self.status = new;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the sale saved (a checkpoint; the sale stays editable).
    pub fn save(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.set_status(SaleStatus::Salva, now)
    }

    /// Cancels the sale, discarding it without a settlement record.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.set_status(SaleStatus::Cancelada, now)
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Finalizes the sale against a payment.
    ///
    /// ## Rules (the Caixa screen's contract)
    /// - requires an editable status and at least one line item
    /// - cash: fails with `InsufficientPayment` when tendered < total;
    ///   troco = tendered − total, already in exact centavos
    /// - card/pix: tendered is forced to the total, troco is zero
    /// - on success the sale becomes `finalizada` with payment metadata
    ///   and a settlement timestamp
    ///
    /// Settling an already-finalized sale fails with `InvalidState` and
    /// performs no mutation (idempotence guard).
    pub fn settle(&mut self, payment: Payment, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.is_editable() {
            return Err(CoreError::InvalidState {
                status: self.status,
                operation: "finalize",
            });
        }

        if self.is_empty() {
            return Err(CoreError::EmptySale);
        }

        let total = self.total_with_discount();

        let (recebido, troco) = match payment {
            Payment::Cash { tendered } => {
                if tendered < total {
                    return Err(CoreError::InsufficientPayment {
                        received: tendered,
                        total,
                    });
                }
                (tendered, tendered - total)
            }
            Payment::Card | Payment::Pix => (total, Money::zero()),
        };

        self.total = total;
        self.forma_pagamento = Some(payment.method());
        self.valor_recebido = Some(recebido);
        self.troco = Some(troco);
        self.finalizada_em = Some(now);
        self.status = SaleStatus::Finalizada;
        self.updated_at = now;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    fn ensure_editable(&self, operation: &'static str) -> CoreResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(CoreError::InvalidState {
                status: self.status,
                operation,
            })
        }
    }

    /// Edits on a saved sale re-enter open semantics.
    fn reopen_if_saved(&mut self) {
        if self.status == SaleStatus::Salva {
            self.status = SaleStatus::Aberta;
        }
    }

    /// Recomputes subtotal/total from the items. Called by every item
    /// mutation in the same step; no public path leaves them stale.
    fn recompute_totals(&mut self) {
        self.subtotal = self.itens.iter().map(|i| i.subtotal).sum();
        // Discount is a settlement concern; until then total mirrors
        // subtotal so open-sale displays never double-apply it.
        self.total = self.subtotal;
    }
}

/// Short human number for the PDV header: date + id prefix.
/// `250823-3f2a` style; uniqueness is carried by the id itself.
fn generate_numero_comanda(id: &str, now: DateTime<Utc>) -> String {
    let prefix: String = id.chars().take(4).collect();
    format!("{}-{}", now.format("%y%m%d"), prefix)
}

// =============================================================================
// Wire helpers
// =============================================================================

/// The wire carries the discount as a percent number (`10`, `7.5`); in
/// memory it is basis points so total math stays integral.
mod desconto_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bps: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*bps as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let percent = f64::deserialize(deserializer)?;
        Ok((percent * 100.0).round() as u32)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, preco_centavos: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            nome: format!("Produto {}", id),
            descricao: None,
            preco_custo: Money::zero(),
            preco_venda: Money::from_centavos(preco_centavos),
            grupo: Some("bebidas".into()),
            unidade: Some("UN".into()),
            estoque: 100,
            ativo: true,
            oculto: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn open_sale(kind: SaleKind) -> Sale {
        Sale::new(
            NewSale {
                kind,
                mesa: None,
                funcionario: "func-1".into(),
                cliente: None,
                nome_comanda: None,
                desconto_bps: 0,
                observacoes: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_subtotal_invariant_under_mutations() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        let chopp = test_product("p1", 1050);
        let porcao = test_product("p2", 3500);

        sale.add_item(&chopp, 2, now).unwrap();
        sale.add_item(&porcao, 1, now).unwrap();
        sale.add_item(&chopp, 1, now).unwrap();
        sale.remove_item("p2", Some(1), now).unwrap();

        let expected: Money = sale.itens.iter().map(|i| i.subtotal).sum();
        assert_eq!(sale.subtotal, expected);
        assert_eq!(sale.subtotal.centavos(), 3 * 1050);
    }

    #[test]
    fn test_add_same_product_merges_lines() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        let chopp = test_product("p1", 1050);

        sale.add_item(&chopp, 2, now).unwrap();
        sale.add_item(&chopp, 3, now).unwrap();

        assert_eq!(sale.item_count(), 1);
        assert_eq!(sale.itens[0].quantidade, 5);
        assert_eq!(sale.itens[0].subtotal.centavos(), 5 * 1050);
    }

    #[test]
    fn test_price_snapshot_is_frozen() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        let mut chopp = test_product("p1", 1050);

        sale.add_item(&chopp, 1, now).unwrap();
        chopp.preco_venda = Money::from_centavos(9999);
        sale.add_item(&chopp, 1, now).unwrap();

        // The merged line keeps the original snapshot price
        assert_eq!(sale.itens[0].preco_unitario.centavos(), 1050);
        assert_eq!(sale.subtotal.centavos(), 2100);
    }

    #[test]
    fn test_remove_more_than_present_deletes_line() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        sale.add_item(&test_product("p1", 500), 2, now).unwrap();

        sale.remove_item("p1", Some(5), now).unwrap();

        assert!(sale.is_empty());
        assert!(sale.subtotal.is_zero());
    }

    #[test]
    fn test_remove_without_quantity_drops_whole_line() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        sale.add_item(&test_product("p1", 500), 3, now).unwrap();

        sale.remove_item("p1", None, now).unwrap();
        assert!(sale.is_empty());
    }

    #[test]
    fn test_remove_missing_item_fails_without_mutation() {
        let mut sale = open_sale(SaleKind::Balcao);
        let now = Utc::now();
        sale.add_item(&test_product("p1", 500), 1, now).unwrap();

        let err = sale.remove_item("p2", None, now).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(sale.item_count(), 1);
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut sale = open_sale(SaleKind::Balcao);
        let err = sale
            .add_item(&test_product("p1", 500), 0, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_save_then_edit_reenters_open() {
        let mut sale = open_sale(SaleKind::Comanda);
        let now = Utc::now();
        sale.add_item(&test_product("p1", 500), 1, now).unwrap();
        sale.save(now).unwrap();
        assert_eq!(sale.status, SaleStatus::Salva);

        sale.add_item(&test_product("p1", 500), 1, now).unwrap();
        assert_eq!(sale.status, SaleStatus::Aberta);
    }

    #[test]
    fn test_transition_table() {
        let now = Utc::now();

        let mut sale = open_sale(SaleKind::Balcao);
        assert!(sale.save(now).is_ok());
        assert!(sale.set_status(SaleStatus::Aberta, now).is_ok());
        assert!(sale.cancel(now).is_ok());

        // finalizada is only reachable through settle()
        let mut sale = open_sale(SaleKind::Balcao);
        let err = sale.set_status(SaleStatus::Finalizada, now).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_terminal_sales_are_immutable() {
        let now = Utc::now();
        let mut sale = open_sale(SaleKind::Balcao);
        sale.add_item(&test_product("p1", 1500), 1, now).unwrap();
        sale.settle(Payment::Pix, now).unwrap();

        let product = test_product("p2", 100);
        assert!(matches!(
            sale.add_item(&product, 1, now).unwrap_err(),
            CoreError::InvalidState { .. }
        ));
        assert!(matches!(
            sale.remove_item("p1", None, now).unwrap_err(),
            CoreError::InvalidState { .. }
        ));
        assert!(matches!(
            sale.set_status(SaleStatus::Aberta, now).unwrap_err(),
            CoreError::InvalidState { .. }
        ));
        assert!(matches!(
            sale.settle(Payment::Pix, now).unwrap_err(),
            CoreError::InvalidState { .. }
        ));
    }

    #[test]
    fn test_cash_settlement_with_change() {
        let now = Utc::now();
        let mut sale = open_sale(SaleKind::Mesa);
        sale.add_item(&test_product("p1", 1500), 1, now).unwrap();

        sale.settle(
            Payment::Cash {
                tendered: Money::from_centavos(2000),
            },
            now,
        )
        .unwrap();

        assert_eq!(sale.status, SaleStatus::Finalizada);
        assert_eq!(sale.forma_pagamento, Some(PaymentMethod::Dinheiro));
        assert_eq!(sale.valor_recebido.unwrap().centavos(), 2000);
        assert_eq!(sale.troco.unwrap().centavos(), 500);
        assert!(sale.finalizada_em.is_some());
    }

    #[test]
    fn test_cash_settlement_insufficient_leaves_sale_open() {
        let now = Utc::now();
        let mut sale = open_sale(SaleKind::Mesa);
        sale.add_item(&test_product("p1", 1500), 1, now).unwrap();

        let err = sale
            .settle(
                Payment::Cash {
                    tendered: Money::from_centavos(1000),
                },
                now,
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::InsufficientPayment { .. }));
        assert_eq!(sale.status, SaleStatus::Aberta);
        assert!(sale.forma_pagamento.is_none());
    }

    #[test]
    fn test_card_and_pix_force_exact_payment() {
        let now = Utc::now();
        for payment in [Payment::Card, Payment::Pix] {
            let mut sale = open_sale(SaleKind::Balcao);
            sale.add_item(&test_product("p1", 1500), 1, now).unwrap();

            sale.settle(payment, now).unwrap();

            assert_eq!(sale.valor_recebido.unwrap().centavos(), 1500);
            assert!(sale.troco.unwrap().is_zero());
        }
    }

    #[test]
    fn test_settle_empty_sale_is_rejected() {
        let now = Utc::now();
        let mut sale = open_sale(SaleKind::Balcao);
        assert!(matches!(
            sale.settle(Payment::Card, now).unwrap_err(),
            CoreError::EmptySale
        ));
    }

    #[test]
    fn test_discount_applies_at_settlement_only() {
        let now = Utc::now();
        let mut sale = Sale::new(
            NewSale {
                kind: SaleKind::Balcao,
                mesa: None,
                funcionario: "func-1".into(),
                cliente: None,
                nome_comanda: None,
                desconto_bps: 1000, // 10%
                observacoes: None,
            },
            now,
        )
        .unwrap();

        sale.add_item(&test_product("p1", 10000), 1, now).unwrap();

        // Before settlement the stored totals never include the discount
        assert_eq!(sale.subtotal.centavos(), 10000);
        assert_eq!(sale.total.centavos(), 10000);
        assert_eq!(sale.total_with_discount().centavos(), 9000);

        sale.settle(
            Payment::Cash {
                tendered: Money::from_centavos(9000),
            },
            now,
        )
        .unwrap();

        assert_eq!(sale.total.centavos(), 9000);
        assert_eq!(sale.subtotal.centavos(), 10000);
        assert!(sale.troco.unwrap().is_zero());
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let mut sale = open_sale(SaleKind::Comanda);

        sale.nome_comanda = Some("Mesa dos fundos".into());
        assert_eq!(sale.display_name(Some("Ana")), "Mesa dos fundos");

        sale.nome_comanda = Some("   ".into());
        assert_eq!(sale.display_name(Some("Ana")), "Ana");

        sale.nome_comanda = None;
        assert_eq!(sale.display_name(None), "Sem nome");
    }

    #[test]
    fn test_wire_round_trip_is_identical() {
        let now = Utc::now();
        let mut sale = open_sale(SaleKind::Comanda);
        sale.nome_comanda = Some("Balcão 2".into());
        sale.add_item(&test_product("p1", 1050), 3, now).unwrap();
        sale.add_item(&test_product("p2", 990), 1, now).unwrap();
        sale.settle(
            Payment::Cash {
                tendered: Money::from_centavos(5000),
            },
            now,
        )
        .unwrap();

        let json = serde_json::to_string(&sale).unwrap();
        let back: Sale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sale);
    }

    #[test]
    fn test_wire_field_names() {
        let sale = open_sale(SaleKind::Balcao);
        let json = serde_json::to_value(&sale).unwrap();

        assert!(json.get("_id").is_some());
        assert_eq!(json["tipoVenda"], "balcao");
        assert_eq!(json["status"], "aberta");
        assert_eq!(json["desconto"], 0.0);
        assert!(json.get("itens").is_some());
        assert!(json.get("numeroComanda").is_some());
    }
}
