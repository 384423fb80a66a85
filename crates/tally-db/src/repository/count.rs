//! # Count Repository
//!
//! Database operations for stock count sessions and their item lines.
//!
//! ## Count Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Count Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── insert_count() → StockCount { status: Planned }                 │
//! │                                                                         │
//! │  2. BUILD ITEM LINES (while editable)                                   │
//! │     └── insert_item() / update_item_count() / delete_item()             │
//! │     └── delete_items() + insert_item()×N  (generator overwrite)         │
//! │     └── auto_fill() → counted = expected in bulk                        │
//! │                                                                         │
//! │  3. TRANSITION                                                          │
//! │     └── transition() → status-guarded conditional UPDATE                │
//! │         (also inserts ledger adjustments in the same transaction        │
//! │          when the engine validates a count)                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The status guard (`WHERE id = ? AND status IN (...)`) is what makes two
//! concurrent `validate` calls mutually exclusive: only one UPDATE can
//! observe `completed`, the other affects zero rows.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{CountStatus, StockCount, StockCountItem};

/// Repository for count session database operations.
#[derive(Debug, Clone)]
pub struct CountRepository {
    pool: SqlitePool,
}

impl CountRepository {
    /// Creates a new CountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CountRepository { pool }
    }

    // =========================================================================
    // Session reads
    // =========================================================================

    /// Gets a count by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockCount>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_by_id(&mut conn, id).await
    }

    /// Gets a count by ID on an explicit connection (usable inside a
    /// transaction).
    pub async fn fetch_by_id(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<StockCount>> {
        let count = sqlx::query_as::<_, StockCount>(
            r#"
            SELECT
                id, tenant_id, count_number, warehouse_id, count_date,
                notes, status, created_at, updated_at, validated_at
            FROM stock_counts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Lists counts for a tenant, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        tenant_id: &str,
        status: Option<CountStatus>,
        limit: u32,
    ) -> DbResult<Vec<StockCount>> {
        let counts = match status {
            Some(status) => {
                sqlx::query_as::<_, StockCount>(
                    r#"
                    SELECT
                        id, tenant_id, count_number, warehouse_id, count_date,
                        notes, status, created_at, updated_at, validated_at
                    FROM stock_counts
                    WHERE tenant_id = ?1 AND status = ?2
                    ORDER BY created_at DESC
                    LIMIT ?3
                    "#,
                )
                .bind(tenant_id)
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StockCount>(
                    r#"
                    SELECT
                        id, tenant_id, count_number, warehouse_id, count_date,
                        notes, status, created_at, updated_at, validated_at
                    FROM stock_counts
                    WHERE tenant_id = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(tenant_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(counts)
    }

    // =========================================================================
    // Session writes
    // =========================================================================

    /// Inserts a new count session.
    pub async fn insert_count(conn: &mut SqliteConnection, count: &StockCount) -> DbResult<()> {
        debug!(id = %count.id, count_number = %count.count_number, "Inserting stock count");

        sqlx::query(
            r#"
            INSERT INTO stock_counts (
                id, tenant_id, count_number, warehouse_id, count_date,
                notes, status, created_at, updated_at, validated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&count.id)
        .bind(&count.tenant_id)
        .bind(&count.count_number)
        .bind(&count.warehouse_id)
        .bind(count.count_date)
        .bind(&count.notes)
        .bind(count.status)
        .bind(count.created_at)
        .bind(count.updated_at)
        .bind(count.validated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Status-guarded transition.
    ///
    /// Flips `status` to `to` only when the current status is one of
    /// `allowed_from`; a `validated` target also stamps `validated_at`.
    ///
    /// ## Returns
    /// `true` when exactly one row flipped; `false` when the count does not
    /// exist or its status was not in `allowed_from`. The caller decides
    /// which of those it is (and reports InvalidState vs NotFound).
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: &str,
        to: CountStatus,
        allowed_from: &[CountStatus],
    ) -> DbResult<bool> {
        let now = Utc::now();

        let placeholders = allowed_from.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = if to == CountStatus::Validated {
            format!(
                "UPDATE stock_counts SET status = ?, updated_at = ?, validated_at = ? \
                 WHERE id = ? AND status IN ({placeholders})"
            )
        } else {
            format!(
                "UPDATE stock_counts SET status = ?, updated_at = ? \
                 WHERE id = ? AND status IN ({placeholders})"
            )
        };

        let mut query = sqlx::query(&sql).bind(to).bind(now);
        if to == CountStatus::Validated {
            query = query.bind(now);
        }
        query = query.bind(id);
        for from in allowed_from {
            query = query.bind(*from);
        }

        let result = query.execute(&mut *conn).await?;

        debug!(id = %id, to = %to, flipped = result.rows_affected() > 0, "Count transition");
        Ok(result.rows_affected() > 0)
    }

    /// Bumps a count's `updated_at` (called when its item lines change).
    pub async fn touch(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE stock_counts SET updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Item reads
    // =========================================================================

    /// Gets all item lines for a count, ordered by SKU.
    pub async fn get_items(&self, count_id: &str) -> DbResult<Vec<StockCountItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_items(&mut conn, count_id).await
    }

    /// Gets all item lines on an explicit connection (usable inside a
    /// transaction, e.g. while validating).
    pub async fn fetch_items(
        conn: &mut SqliteConnection,
        count_id: &str,
    ) -> DbResult<Vec<StockCountItem>> {
        let items = sqlx::query_as::<_, StockCountItem>(
            r#"
            SELECT
                id, stock_count_id, product_id, sku_snapshot, name_snapshot,
                expected_quantity, counted_quantity, notes, created_at, updated_at
            FROM stock_count_items
            WHERE stock_count_id = ?1
            ORDER BY sku_snapshot, id
            "#,
        )
        .bind(count_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Gets one item line, scoped to its count.
    pub async fn fetch_item(
        conn: &mut SqliteConnection,
        count_id: &str,
        item_id: &str,
    ) -> DbResult<Option<StockCountItem>> {
        let item = sqlx::query_as::<_, StockCountItem>(
            r#"
            SELECT
                id, stock_count_id, product_id, sku_snapshot, name_snapshot,
                expected_quantity, counted_quantity, notes, created_at, updated_at
            FROM stock_count_items
            WHERE stock_count_id = ?1 AND id = ?2
            "#,
        )
        .bind(count_id)
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Product ids already present in a count (generator skip set).
    pub async fn item_product_ids(
        conn: &mut SqliteConnection,
        count_id: &str,
    ) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT product_id FROM stock_count_items WHERE stock_count_id = ?1",
        )
        .bind(count_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    // =========================================================================
    // Item writes
    // =========================================================================

    /// Inserts an item line.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the count already has a line for the
    /// same product (UNIQUE (stock_count_id, product_id)).
    pub async fn insert_item(conn: &mut SqliteConnection, item: &StockCountItem) -> DbResult<()> {
        debug!(count_id = %item.stock_count_id, product_id = %item.product_id, "Inserting count item");

        sqlx::query(
            r#"
            INSERT INTO stock_count_items (
                id, stock_count_id, product_id, sku_snapshot, name_snapshot,
                expected_quantity, counted_quantity, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.stock_count_id)
        .bind(&item.product_id)
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .bind(item.expected_quantity)
        .bind(item.counted_quantity)
        .bind(&item.notes)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates an item's counted quantity.
    ///
    /// ## Returns
    /// Rows affected (0 when the item is not in this count).
    pub async fn update_item_count(
        conn: &mut SqliteConnection,
        count_id: &str,
        item_id: &str,
        counted_quantity: i64,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_count_items SET
                counted_quantity = ?1,
                updated_at = ?2
            WHERE stock_count_id = ?3 AND id = ?4
            "#,
        )
        .bind(counted_quantity)
        .bind(now)
        .bind(count_id)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one item line. Returns rows affected.
    pub async fn delete_item(
        conn: &mut SqliteConnection,
        count_id: &str,
        item_id: &str,
    ) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM stock_count_items WHERE stock_count_id = ?1 AND id = ?2")
                .bind(count_id)
                .bind(item_id)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every item line of a count (generator overwrite).
    /// Returns rows affected.
    pub async fn delete_items(conn: &mut SqliteConnection, count_id: &str) -> DbResult<u64> {
        debug!(count_id = %count_id, "Deleting all count items");

        let result = sqlx::query("DELETE FROM stock_count_items WHERE stock_count_id = ?1")
            .bind(count_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Bulk-fills counted quantities from expected quantities.
    /// Returns rows affected.
    pub async fn auto_fill(conn: &mut SqliteConnection, count_id: &str) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_count_items SET
                counted_quantity = expected_quantity,
                updated_at = ?1
            WHERE stock_count_id = ?2
            "#,
        )
        .bind(now)
        .bind(count_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
