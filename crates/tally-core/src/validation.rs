//! # Validation Module
//!
//! Input validation utilities for Tally.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / automation)                                     │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine operation (Rust)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules, before any mutation                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (count_number, count/product pairs)            │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_COUNT_QUANTITY, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a required entity reference (warehouse_id, product_id, ...).
///
/// ## Rules
/// - Must not be empty
/// - Must be a valid UUID format
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_id;
///
/// assert!(validate_id("warehouse_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("warehouse_id", "").is_err());
/// assert!(validate_id("warehouse_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates an optional entity reference (category filter).
///
/// `None` is always valid; `Some` must pass [`validate_id`].
pub fn validate_optional_id(field: &str, id: Option<&str>) -> ValidationResult<()> {
    match id {
        Some(id) => validate_id(field, id),
        None => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a count quantity (expected or counted).
///
/// ## Rules
/// - Must be zero or greater (a physical count can never be negative)
/// - Must not exceed MAX_COUNT_QUANTITY
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_quantity;
///
/// assert!(validate_quantity("counted_quantity", 0).is_ok());
/// assert!(validate_quantity("counted_quantity", 150).is_ok());
/// assert!(validate_quantity("counted_quantity", -1).is_err());
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    if qty > MAX_COUNT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_COUNT_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates free-form notes.
///
/// ## Rules
/// - `None` / empty is fine
/// - Maximum MAX_NOTES_LEN characters
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
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
    fn test_validate_id() {
        assert!(validate_id("warehouse_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());

        assert!(validate_id("warehouse_id", "").is_err());
        assert!(validate_id("warehouse_id", "   ").is_err());
        assert!(validate_id("warehouse_id", "not-a-uuid").is_err());
        assert!(validate_id("warehouse_id", "123").is_err());
    }

    #[test]
    fn test_validate_optional_id() {
        assert!(validate_optional_id("category_id", None).is_ok());
        assert!(
            validate_optional_id("category_id", Some("550e8400-e29b-41d4-a716-446655440000"))
                .is_ok()
        );
        assert!(validate_optional_id("category_id", Some("bogus")).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("expected_quantity", 0).is_ok());
        assert!(validate_quantity("expected_quantity", 1).is_ok());
        assert!(validate_quantity("expected_quantity", MAX_COUNT_QUANTITY).is_ok());

        assert!(validate_quantity("expected_quantity", -1).is_err());
        assert!(validate_quantity("expected_quantity", MAX_COUNT_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("shrink suspected on aisle 4")).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());
    }
}
