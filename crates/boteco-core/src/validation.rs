//! # Validation Module
//!
//! Input validation utilities shared by every API entry point.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Frontend (React forms)                                    │
//! │  └── Basic format checks, immediate feedback                        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: HTTP handler (Rust)                                       │
//! │  └── THIS MODULE: business rule validation                          │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── NOT NULL / UNIQUE / FK constraints                             │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, customer, employee, mesa, tab).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_nome(nome: &str) -> ValidationResult<()> {
    let nome = nome.trim();

    if nome.is_empty() {
        return Err(ValidationError::Required { field: "nome" });
    }

    if nome.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "nome",
            max: 200,
        });
    }

    Ok(())
}

/// Validates a mesa number.
///
/// Mesa numbers are short free text ("5", "12A"); uniqueness is enforced
/// by the database.
pub fn validate_mesa_numero(numero: &str) -> ValidationResult<()> {
    let numero = numero.trim();

    if numero.is_empty() {
        return Err(ValidationError::Required { field: "numero" });
    }

    if numero.len() > 10 {
        return Err(ValidationError::TooLong {
            field: "numero",
            max: 10,
        });
    }

    Ok(())
}

/// Validates an entity id (UUID v4 format).
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required { field: "id" });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id",
        reason: "must be a valid UUID",
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0); a quantity of zero is expressed by removing
///   the line, never by storing a zero row
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantidade(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantidade" });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantidade",
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (courtesy items).
pub fn validate_preco(preco: Money) -> ValidationResult<()> {
    if preco.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "preco",
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_desconto_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "desconto",
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a mesa capacity.
pub fn validate_capacidade(capacidade: i64) -> ValidationResult<()> {
    if capacidade < 1 || capacidade > 50 {
        return Err(ValidationError::OutOfRange {
            field: "capacidade",
            min: 1,
            max: 50,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates sale size (number of unique line items).
pub fn validate_sale_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "itens",
            min: 0,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nome() {
        assert!(validate_nome("Chopp Artesanal 500ml").is_ok());
        assert!(validate_nome("").is_err());
        assert!(validate_nome("   ").is_err());
        assert!(validate_nome(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantidade() {
        assert!(validate_quantidade(1).is_ok());
        assert!(validate_quantidade(999).is_ok());

        assert!(validate_quantidade(0).is_err());
        assert!(validate_quantidade(-1).is_err());
        assert!(validate_quantidade(1000).is_err());
    }

    #[test]
    fn test_validate_preco() {
        assert!(validate_preco(Money::from_centavos(0)).is_ok());
        assert!(validate_preco(Money::from_centavos(1099)).is_ok());
        assert!(validate_preco(Money::from_centavos(-100)).is_err());
    }

    #[test]
    fn test_validate_desconto_bps() {
        assert!(validate_desconto_bps(0).is_ok());
        assert!(validate_desconto_bps(10_000).is_ok());
        assert!(validate_desconto_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_mesa_numero() {
        assert!(validate_mesa_numero("12A").is_ok());
        assert!(validate_mesa_numero("").is_err());
        assert!(validate_mesa_numero("12345678901").is_err());
    }
}
