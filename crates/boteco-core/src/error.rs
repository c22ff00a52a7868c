//! # Error Types
//!
//! Domain-specific error types for boteco-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  boteco-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  boteco-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  HTTP API errors (apps/server)                                      │
//! │  └── ApiError         - What the frontend sees (status + JSON)      │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, statuses)
//! 3. Errors are enum variants, never bare strings
//! 4. Every variant maps to a user-facing message at the API boundary

use thiserror::Error;

use crate::sale::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant corresponds to one failure mode of the sale lifecycle;
/// none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An unresolvable product/sale/mesa reference.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Mutation attempted on a terminal or mismatched-status sale.
    ///
    /// ## When This Occurs
    /// - adding/removing items on a finalized or cancelled sale
    /// - settling a sale twice
    /// - closing a mesa that is under maintenance
    #[error("sale is {status:?}, cannot {operation}")]
    InvalidState {
        status: SaleStatus,
        operation: &'static str,
    },

    /// Illegal status change (not in the transition table).
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SaleStatus, to: SaleStatus },

    /// Cash tendered below the sale total.
    #[error("insufficient payment: received {received}, total {total}")]
    InsufficientPayment {
        received: crate::money::Money,
        total: crate::money::Money,
    },

    /// Attempt to open a sale on a mesa that already has one.
    #[error("mesa {mesa_id} already has an open sale")]
    MesaOccupied { mesa_id: String },

    /// A sale cannot be settled without items.
    #[error("sale has no items to finalize")]
    EmptySale,

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientPayment {
            received: Money::from_centavos(1000),
            total: Money::from_centavos(1500),
        };
        assert_eq!(
            err.to_string(),
            "insufficient payment: received R$ 10.00, total R$ 15.00"
        );

        let err = CoreError::not_found("Produto", "abc");
        assert_eq!(err.to_string(), "Produto not found: abc");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required { field: "nome" };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
