//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of Tally. It contains the inventory
//! reconciliation rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          UI / Automation (external collaborators)               │   │
//! │  │    count pages ──► generation dialogs ──► report export         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-engine                                 │   │
//! │  │    sessions, item generator, lifecycle, summaries               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ reconcile │  │   money   │  │ validation│  │   │
//! │  │   │StockCount │  │ summarize │  │   Money   │  │   rules   │  │   │
//! │  │   │CountStatus│  │discrepancy│  │  (cents)  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, count + ledger repos         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockCount, StockCountItem, CountStatus, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`reconcile`] - On-demand discrepancy and valuation math
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Derived, Not Stored**: a line's difference and a count's summary are
//!    recomputed from current rows on every read
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::reconcile::summarize;
//! use std::collections::HashMap;
//!
//! // An empty count summarizes to zeroes (match_rate is 0, not NaN)
//! let summary = summarize(&[], &HashMap::new());
//! assert_eq!(summary.statistics.match_rate, 0.0);
//! assert_eq!(summary.quantities.net_difference, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use reconcile::{CountStatistics, CountSummary, QuantityTotals, ValueTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-tenant runtime with multi-tenant schema)
///
/// ## Why a constant?
/// v0.1 is single-tenant, but the database schema includes tenant_id so the
/// count_number uniqueness rule is already scoped per organization. This
/// constant is used throughout the codebase and will be replaced with
/// dynamic tenant resolution when multi-tenancy lands.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum quantity accepted on a single count line
///
/// ## Business Reason
/// A physical count above this is a data-entry error (e.g. a scanned
/// barcode landing in the quantity field), not a real stocktake figure.
pub const MAX_COUNT_QUANTITY: i64 = 1_000_000;

/// Maximum length of free-form notes on counts and count lines
pub const MAX_NOTES_LEN: usize = 1_000;
