//! # Domain Types
//!
//! Catalog and venue types used throughout Boteco POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │   Product     │   │     Mesa      │   │  Employee /   │          │
//! │  │  ───────────  │   │  ───────────  │   │   Customer    │          │
//! │  │  id (UUID)    │   │  numero       │   │  ───────────  │          │
//! │  │  nome         │   │  capacidade   │   │  id (UUID)    │          │
//! │  │  preco        │   │  kind         │   │  nome         │          │
//! │  │  ativo        │   │  base status  │   │  ativo        │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! │                                                                     │
//! │  The Sale aggregate lives in [`crate::sale`]; everything here is    │
//! │  referenced by it but owned by the catalog.                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Compatibility
//! Field names follow the JSON documents the existing React frontend
//! already consumes (Portuguese, camelCase). One quirk is preserved on
//! purpose: products travel with `id` while every other entity travels
//! with `_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Line items snapshot `nome`/`preco` at add time; they never re-read
/// the live product after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the PDV grid and on line items.
    pub nome: String,

    pub descricao: Option<String>,

    /// Cost price, for margin reports. Never shown on the PDV.
    pub preco_custo: Money,

    /// Sale price. The registration form posts this as `precoVenda`;
    /// the PDV reads it back as `preco`. Accept both, emit `preco`.
    #[serde(rename = "preco", alias = "precoVenda")]
    pub preco_venda: Money,

    /// Group/category tag (free text, managed via product-group).
    pub grupo: Option<String>,

    /// Unit of measure (UN, KG, L, ...).
    pub unidade: Option<String>,

    /// Current stock quantity.
    pub estoque: i64,

    /// Whether the product is active (soft delete).
    pub ativo: bool,

    /// Hidden from the PDV grid but still orderable by id.
    #[serde(default)]
    pub oculto: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customer / Employee
// =============================================================================

/// A registered customer. Referenced by sales for display and for tab
/// name fallback; not otherwise constrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub endereco: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A staff member. Every sale is attributed to the employee operating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub cargo: Option<String>,
    pub telefone: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product Group / Unit of Measure
// =============================================================================

/// Whether a [`ProductGroup`] row is a category or a unit of measure.
/// The management screen edits both through the same endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ProductGroupKind {
    Grupo,
    Unidade,
}

/// A product category ("bebidas") or unit of measure ("KG").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProductGroup {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub descricao: Option<String>,
    /// Emoji icon for group cards.
    pub icone: Option<String>,
    /// Abbreviation for units ("UN", "KG").
    pub sigla: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: ProductGroupKind,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Mesa (Table)
// =============================================================================

/// Physical placement/category of a mesa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MesaKind {
    Interna,
    Externa,
    Vip,
    Reservada,
    Balcao,
}

/// Mesa status as shown to the floor staff.
///
/// ## Occupancy Is Derived
/// `Ocupada` is never stored. A mesa is occupied iff an open sale
/// references it; the stored column only carries the states that cannot
/// be derived (`livre`, `reservada`, `manutencao`). This removes the
/// status drift the stored-field design suffered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MesaStatus {
    Livre,
    Ocupada,
    Reservada,
    Manutencao,
}

impl MesaStatus {
    /// Combines the stored base status with the derived occupancy fact.
    /// An open sale always wins over the stored state.
    pub fn effective(base: MesaStatus, has_open_sale: bool) -> MesaStatus {
        if has_open_sale {
            MesaStatus::Ocupada
        } else {
            base
        }
    }
}

/// A physical seating unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Mesa {
    #[serde(rename = "_id")]
    pub id: String,

    /// Human number, unique within the venue ("5", "12A").
    pub numero: String,

    pub nome: String,
    pub capacidade: i64,

    #[serde(rename = "tipo")]
    pub kind: MesaKind,

    /// Stored base status. See [`MesaStatus`] for why `ocupada` never
    /// appears here.
    pub status: MesaStatus,

    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_status_derives_occupancy() {
        assert_eq!(
            MesaStatus::effective(MesaStatus::Livre, true),
            MesaStatus::Ocupada
        );
        assert_eq!(
            MesaStatus::effective(MesaStatus::Livre, false),
            MesaStatus::Livre
        );
        // A reservation with an open sale shows as occupied
        assert_eq!(
            MesaStatus::effective(MesaStatus::Reservada, true),
            MesaStatus::Ocupada
        );
    }

    #[test]
    fn test_status_wire_names_are_portuguese() {
        assert_eq!(
            serde_json::to_string(&MesaStatus::Manutencao).unwrap(),
            "\"manutencao\""
        );
        assert_eq!(serde_json::to_string(&MesaKind::Vip).unwrap(), "\"vip\"");
    }

    #[test]
    fn test_product_wire_uses_preco_and_id() {
        let now = Utc::now();
        let product = Product {
            id: "p1".into(),
            nome: "Chopp".into(),
            descricao: None,
            preco_custo: Money::from_centavos(400),
            preco_venda: Money::from_centavos(1050),
            grupo: Some("bebidas".into()),
            unidade: Some("UN".into()),
            estoque: 10,
            ativo: true,
            oculto: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["preco"], 10.5);
        assert!(json.get("precoVenda").is_none());

        // The registration form still posts precoVenda
        let mut as_form = json.clone();
        as_form["precoVenda"] = as_form["preco"].take();
        as_form.as_object_mut().unwrap().remove("preco");
        let back: Product = serde_json::from_value(as_form).unwrap();
        assert_eq!(back.preco_venda.centavos(), 1050);
    }
}
