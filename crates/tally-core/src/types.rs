//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockCount    │   │ StockCountItem  │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  count_number   │   │  stock_count_id │   │  warehouse_id   │       │
//! │  │  warehouse_id   │   │  product_id     │   │  product_id     │       │
//! │  │  status         │   │  expected/      │   │  quantity (±)   │       │
//! │  │  count_date     │   │    counted qty  │   │  reference      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CountStatus   │   │    Warehouse    │   │     Product     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Planned        │   │  id, code, name │   │  id, sku, name  │       │
//! │  │  InProgress     │   └─────────────────┘   │  category_id    │       │
//! │  │  Completed      │                         │  unit_value     │       │
//! │  │  Validated      │                         └─────────────────┘       │
//! │  │  Cancelled      │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (count_number, sku, warehouse code) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Count Status
// =============================================================================

/// The status of a stock count session.
///
/// ## Lifecycle
/// ```text
/// planned ──► in_progress ──► completed ──► validated (terminal)
///    │             │
///    └─────────────┴──► cancelled (terminal)
/// ```
///
/// Only the Lifecycle Controller in tally-engine moves a count between
/// statuses; item edits are legal only while the count is editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CountStatus {
    /// Count is scheduled; items may be prepared. `draft` is accepted as
    /// an input synonym.
    #[serde(alias = "draft")]
    Planned,
    /// Operators are entering counted quantities.
    InProgress,
    /// Counting is finished; items are read-only, awaiting validation.
    Completed,
    /// Discrepancies have been committed to the stock ledger.
    Validated,
    /// Count was abandoned; no ledger effect.
    Cancelled,
}

impl CountStatus {
    /// Lowercase database/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CountStatus::Planned => "planned",
            CountStatus::InProgress => "in_progress",
            CountStatus::Completed => "completed",
            CountStatus::Validated => "validated",
            CountStatus::Cancelled => "cancelled",
        }
    }

    /// Whether items may still be added, edited, or removed.
    pub const fn is_editable(&self) -> bool {
        matches!(self, CountStatus::Planned | CountStatus::InProgress)
    }

    /// Whether the status is terminal (no transition leaves it).
    pub const fn is_terminal(&self) -> bool {
        matches!(self, CountStatus::Validated | CountStatus::Cancelled)
    }

    /// Whether `start` is legal from this status.
    pub const fn can_start(&self) -> bool {
        matches!(self, CountStatus::Planned)
    }

    /// Whether `complete` is legal from this status.
    pub const fn can_complete(&self) -> bool {
        matches!(self, CountStatus::InProgress)
    }

    /// Whether `validate` is legal from this status.
    pub const fn can_validate(&self) -> bool {
        matches!(self, CountStatus::Completed)
    }

    /// Whether `cancel` is legal from this status.
    pub const fn can_cancel(&self) -> bool {
        matches!(self, CountStatus::Planned | CountStatus::InProgress)
    }
}

impl Default for CountStatus {
    fn default() -> Self {
        CountStatus::Planned
    }
}

impl std::fmt::Display for CountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Count
// =============================================================================

/// One physical inventory session against a single warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockCount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this count belongs to.
    pub tenant_id: String,

    /// Human-readable count number, unique per tenant (e.g. SC-20260131-0042).
    pub count_number: String,

    /// The warehouse being counted. Exactly one per session.
    pub warehouse_id: String,

    /// Business date of the count.
    pub count_date: NaiveDate,

    /// Free-form operator notes.
    pub notes: Option<String>,

    /// Lifecycle status; moves only via the Lifecycle Controller.
    pub status: CountStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when the count reaches `validated`.
    pub validated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Stock Count Item
// =============================================================================

/// One product line within a stock count.
/// Uses the snapshot pattern to freeze product identity at add time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockCountItem {
    pub id: String,
    pub stock_count_id: String,
    pub product_id: String,
    /// SKU at the time the line was created (frozen).
    pub sku_snapshot: String,
    /// Product name at the time the line was created (frozen).
    pub name_snapshot: String,
    /// System-recorded on-hand quantity, snapshotted at generation/add time.
    pub expected_quantity: i64,
    /// Operator-entered physical count.
    pub counted_quantity: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockCountItem {
    /// Discrepancy for this line: counted minus expected.
    ///
    /// Surplus-positive: `> 0` means more was found than recorded, `< 0`
    /// means less, `0` is a match. Always derived, never stored.
    #[inline]
    pub const fn difference(&self) -> i64 {
        self.counted_quantity - self.expected_quantity
    }

    /// Whether counted and expected quantities agree.
    #[inline]
    pub const fn is_match(&self) -> bool {
        self.difference() == 0
    }
}

// =============================================================================
// Stock Count Aggregate
// =============================================================================

/// A stock count together with its item lines.
///
/// This is what `get_session` returns and what report renderers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCountWithItems {
    pub count: StockCount,
    pub items: Vec<StockCountItem>,
}

// =============================================================================
// Warehouse
// =============================================================================

/// A physical stock location. Owned by the stock ledger, referenced by
/// counts via `warehouse_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: String,
    pub tenant_id: String,
    /// Short business code (e.g. "WH-MAIN").
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Owned by the stock ledger; counts keep snapshots of
/// sku/name so a validated count stays readable after catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    /// Optional category used by the Item Generator's filter.
    pub category_id: Option<String>,
    /// Unit value in cents, used for count valuation.
    pub unit_value_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit value as a Money type.
    #[inline]
    pub fn unit_value(&self) -> Money {
        Money::from_cents(self.unit_value_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// A signed stock ledger entry. Count validation writes one movement per
/// discrepant line, with `reference` pointing back at the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub warehouse_id: String,
    pub product_id: String,
    /// Signed quantity: positive receipts, negative issues.
    pub quantity: i64,
    /// Movement reason (count adjustments use [`ADJUSTMENT_REASON`]).
    pub reason: String,
    /// Originating document id (stock count id for adjustments).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Movement reason recorded for count-validation adjustments.
pub const ADJUSTMENT_REASON: &str = "stock_count";

// =============================================================================
// Item Generator Options & Report
// =============================================================================

/// Options for bulk item generation from the ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Include products whose on-hand quantity is zero.
    pub include_zero_stock: bool,
    /// Replace all existing items instead of skipping present products.
    pub overwrite: bool,
    /// Restrict generation to one product category.
    pub category_id: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            include_zero_stock: false,
            overwrite: false,
            category_id: None,
        }
    }
}

/// Outcome of one `generate_items` run.
///
/// `skipped` counts products left alone because the session already had a
/// line for them (overwrite=false). Zero-stock products dropped by the
/// filter are not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReport {
    pub created: usize,
    pub skipped: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================
