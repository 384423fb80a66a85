//! # Session Operations
//!
//! Count session CRUD and manual item line management.
//!
//! ## Manual vs. Generated Lines
//! `add_item` is the operator's explicit "count this product" action, so a
//! product already present is a hard `Conflict`. Bulk generation
//! (`generate_items`) tolerates existing lines and skips them silently -
//! that asymmetry is intentional, the two callers expect different things.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tally_core::validation::{validate_id, validate_notes, validate_quantity};
use tally_core::{CoreError, CountStatus, StockCount, StockCountItem, StockCountWithItems};
use tally_db::{CountRepository, DbError, LedgerRepository};

use crate::engine::CountEngine;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Request Types
// =============================================================================

/// Request to open a new count session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCount {
    /// The warehouse to count. Required.
    pub warehouse_id: String,
    /// Business date; defaults to today when omitted.
    pub count_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Request to add one manual item line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCountItem {
    pub product_id: String,
    /// System-recorded quantity the operator is counting against.
    pub expected_quantity: i64,
    /// Physical count; zero when counting hasn't started.
    pub counted_quantity: i64,
    pub notes: Option<String>,
}

// =============================================================================
// Operations
// =============================================================================

impl CountEngine {
    /// Opens a new count session in `planned`.
    ///
    /// ## Errors
    /// - `InvalidInput` - missing/malformed warehouse_id, oversized notes
    /// - `NotFound` - warehouse does not exist for this tenant
    pub async fn create_session(&self, req: CreateCount) -> EngineResult<StockCount> {
        debug!(warehouse_id = %req.warehouse_id, "create_session");

        validate_id("warehouse_id", &req.warehouse_id).map_err(CoreError::from)?;
        validate_notes(req.notes.as_deref()).map_err(CoreError::from)?;

        let mut tx = self.db().begin().await?;

        let warehouse = LedgerRepository::fetch_warehouse(&mut tx, &req.warehouse_id)
            .await?
            .filter(|w| w.tenant_id == self.tenant_id())
            .ok_or_else(|| CoreError::WarehouseNotFound(req.warehouse_id.clone()))?;

        let now = Utc::now();
        let count = StockCount {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id().to_string(),
            count_number: generate_count_number(),
            warehouse_id: warehouse.id,
            count_date: req.count_date.unwrap_or_else(|| now.date_naive()),
            notes: req.notes,
            status: CountStatus::Planned,
            created_at: now,
            updated_at: now,
            validated_at: None,
        };

        CountRepository::insert_count(&mut tx, &count).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count.id, count_number = %count.count_number, "Stock count created");
        Ok(count)
    }

    /// Loads a count session with all of its item lines.
    pub async fn get_session(&self, count_id: &str) -> EngineResult<StockCountWithItems> {
        let count = self.get_count(count_id).await?;
        let items = self.db().counts().get_items(count_id).await?;

        Ok(StockCountWithItems { count, items })
    }

    /// Adds one manual item line to an editable session.
    ///
    /// ## Errors
    /// - `InvalidInput` - negative or oversized quantities
    /// - `NotFound` - unknown session or product
    /// - `InvalidState` - session is no longer editable
    /// - `Conflict` - the product already has a line in this session
    pub async fn add_item(&self, count_id: &str, req: NewCountItem) -> EngineResult<StockCountItem> {
        debug!(count_id = %count_id, product_id = %req.product_id, "add_item");

        validate_id("product_id", &req.product_id).map_err(CoreError::from)?;
        validate_quantity("expected_quantity", req.expected_quantity).map_err(CoreError::from)?;
        validate_quantity("counted_quantity", req.counted_quantity).map_err(CoreError::from)?;
        validate_notes(req.notes.as_deref()).map_err(CoreError::from)?;

        let mut tx = self.db().begin().await?;

        let count = Self::fetch_count(&mut tx, count_id).await?;
        Self::ensure_editable(&count, "add item")?;

        let product = LedgerRepository::fetch_product(&mut tx, &req.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

        let now = Utc::now();
        let item = StockCountItem {
            id: Uuid::new_v4().to_string(),
            stock_count_id: count.id.clone(),
            product_id: product.id,
            sku_snapshot: product.sku,
            name_snapshot: product.name,
            expected_quantity: req.expected_quantity,
            counted_quantity: req.counted_quantity,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };

        // The UNIQUE (stock_count_id, product_id) index is the authoritative
        // duplicate check
        CountRepository::insert_item(&mut tx, &item)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => EngineError::Core(CoreError::DuplicateProduct {
                    count_id: count.id.clone(),
                    product_id: item.product_id.clone(),
                }),
                other => other.into(),
            })?;
        CountRepository::touch(&mut tx, count_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count_id, item_id = %item.id, sku = %item.sku_snapshot, "Count item added");
        Ok(item)
    }

    /// Updates an item's counted quantity on an editable session and
    /// returns the updated line.
    pub async fn update_item_count(
        &self,
        count_id: &str,
        item_id: &str,
        counted_quantity: i64,
    ) -> EngineResult<StockCountItem> {
        debug!(count_id = %count_id, item_id = %item_id, counted = %counted_quantity, "update_item_count");

        validate_quantity("counted_quantity", counted_quantity).map_err(CoreError::from)?;

        let mut tx = self.db().begin().await?;

        let count = Self::fetch_count(&mut tx, count_id).await?;
        Self::ensure_editable(&count, "update counted quantity")?;

        let rows =
            CountRepository::update_item_count(&mut tx, count_id, item_id, counted_quantity)
                .await?;
        if rows == 0 {
            return Err(CoreError::ItemNotFound(item_id.to_string()).into());
        }

        let item = CountRepository::fetch_item(&mut tx, count_id, item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        CountRepository::touch(&mut tx, count_id).await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(item)
    }

    /// Deletes one item line from an editable session.
    pub async fn delete_item(&self, count_id: &str, item_id: &str) -> EngineResult<()> {
        debug!(count_id = %count_id, item_id = %item_id, "delete_item");

        let mut tx = self.db().begin().await?;

        let count = Self::fetch_count(&mut tx, count_id).await?;
        Self::ensure_editable(&count, "delete item")?;

        let rows = CountRepository::delete_item(&mut tx, count_id, item_id).await?;
        if rows == 0 {
            return Err(CoreError::ItemNotFound(item_id.to_string()).into());
        }
        CountRepository::touch(&mut tx, count_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count_id, item_id = %item_id, "Count item deleted");
        Ok(())
    }
}

// =============================================================================
// Count Number Generation
// =============================================================================

/// Generates a count number in format: SC-YYYYMMDD-NNNN
///
/// ## Format
/// - SC: document prefix (stock count)
/// - YYYYMMDD: date
/// - NNNN: sub-second sequence (padded to 4 digits)
///
/// ## Example
/// `SC-20260131-0417`
///
/// Uniqueness per tenant is ultimately enforced by the database index; a
/// same-millisecond collision surfaces as a duplicate error to retry.
fn generate_count_number() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("SC-{}-{:04}", now.format("%Y%m%d"), nanos % 10_000)
}
