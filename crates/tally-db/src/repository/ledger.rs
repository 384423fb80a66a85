//! # Ledger Repository
//!
//! The stock ledger adapter: everything the reconciliation engine consumes
//! from the ledger side of the database.
//!
//! ## Adjustment Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Count Validation Write Path                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE stock_counts SET status = 'validated'                │   │
//! │  │     WHERE id = ? AND status = 'completed'                       │   │
//! │  │                                                                 │   │
//! │  │  2. For each line with difference != 0:                         │   │
//! │  │     INSERT INTO stock_movements (… quantity, reference …)       │   │
//! │  │     UPSERT warehouse_stock.on_hand += difference                │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← All adjustments land or none do (atomicity guaranteed)       │
//! │                                                                         │
//! │  ❌ WRONG: absolute update (clobbers interleaved receipts)             │
//! │     UPDATE warehouse_stock SET on_hand = 7                             │
//! │                                                                         │
//! │  ✅ CORRECT: delta update                                              │
//! │     UPDATE warehouse_stock SET on_hand = on_hand + (-3)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{Money, Product, StockMovement, Warehouse, ADJUSTMENT_REASON};

/// One row of the on-hand snapshot used by the item generator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OnHandEntry {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub on_hand: i64,
}

/// Repository for stock ledger database operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a warehouse by ID on an explicit connection.
    pub async fn fetch_warehouse(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, tenant_id, code, name, is_active, created_at, updated_at
            FROM warehouses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(warehouse)
    }

    /// Gets a product by ID on an explicit connection.
    pub async fn fetch_product(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, sku, name, category_id, unit_value_cents,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Current on-hand quantity per active product for one warehouse,
    /// optionally filtered to a category. Products with no stock row report
    /// zero on hand.
    ///
    /// This is the bulk snapshot the item generator freezes into
    /// `expected_quantity`.
    pub async fn on_hand_for_warehouse(
        conn: &mut SqliteConnection,
        warehouse_id: &str,
        category_id: Option<&str>,
    ) -> DbResult<Vec<OnHandEntry>> {
        let entries = sqlx::query_as::<_, OnHandEntry>(
            r#"
            SELECT
                p.id AS product_id,
                p.sku,
                p.name,
                COALESCE(ws.on_hand, 0) AS on_hand
            FROM products p
            LEFT JOIN warehouse_stock ws
                ON ws.product_id = p.id AND ws.warehouse_id = ?1
            WHERE p.is_active = 1
              AND (?2 IS NULL OR p.category_id = ?2)
            ORDER BY p.sku
            "#,
        )
        .bind(warehouse_id)
        .bind(category_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }

    /// Current on-hand quantity for one (warehouse, product) pair.
    pub async fn on_hand(&self, warehouse_id: &str, product_id: &str) -> DbResult<i64> {
        let on_hand: Option<i64> = sqlx::query_scalar(
            "SELECT on_hand FROM warehouse_stock WHERE warehouse_id = ?1 AND product_id = ?2",
        )
        .bind(warehouse_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(on_hand.unwrap_or(0))
    }

    /// Unit values for every product referenced by a count's item lines.
    ///
    /// Keyed by product_id; the reconciliation calculator treats missing
    /// keys as zero-valued.
    pub async fn unit_values_for_count(&self, count_id: &str) -> DbResult<HashMap<String, Money>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT p.id, p.unit_value_cents
            FROM products p
            INNER JOIN stock_count_items i ON i.product_id = p.id
            WHERE i.stock_count_id = ?1
            "#,
        )
        .bind(count_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, cents)| (id, Money::from_cents(cents)))
            .collect())
    }

    /// Movement history for one reference document (e.g. a validated count).
    pub async fn movements_for_reference(
        &self,
        reference: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, warehouse_id, product_id, quantity, reason, reference, created_at
            FROM stock_movements
            WHERE reference = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    // =========================================================================
    // Adjustment write (transactional)
    // =========================================================================

    /// Records one signed adjustment movement and applies it to the on-hand
    /// quantity, on the caller's connection.
    ///
    /// ## Arguments
    /// * `quantity` - Signed delta (positive surplus, negative deficit)
    /// * `reference` - Originating document id (the stock count id)
    ///
    /// Designed to run inside the engine's validation transaction: if any
    /// adjustment of a batch fails, the caller's rollback removes them all.
    pub async fn apply_adjustment(
        conn: &mut SqliteConnection,
        warehouse_id: &str,
        product_id: &str,
        quantity: i64,
        reference: &str,
    ) -> DbResult<()> {
        debug!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            quantity = %quantity,
            reference = %reference,
            "Applying stock adjustment"
        );

        let now = Utc::now();
        let movement_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, warehouse_id, product_id, quantity, reason, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement_id)
        .bind(warehouse_id)
        .bind(product_id)
        .bind(quantity)
        .bind(ADJUSTMENT_REASON)
        .bind(reference)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        // Delta upsert: never clobber interleaved movements with an absolute
        // value
        sqlx::query(
            r#"
            INSERT INTO warehouse_stock (warehouse_id, product_id, on_hand, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET
                on_hand = on_hand + excluded.on_hand,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Catalog fixtures (seed binary and tests)
    // =========================================================================

    /// Inserts a warehouse.
    pub async fn insert_warehouse(&self, warehouse: &Warehouse) -> DbResult<()> {
        debug!(code = %warehouse.code, "Inserting warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, tenant_id, code, name, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.tenant_id)
        .bind(&warehouse.code)
        .bind(&warehouse.name)
        .bind(warehouse.is_active)
        .bind(warehouse.created_at)
        .bind(warehouse.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a catalog product.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, sku, name, category_id, unit_value_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.unit_value_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets an absolute on-hand quantity for a (warehouse, product) pair.
    ///
    /// Fixture-only: real stock changes flow through [`apply_adjustment`]
    /// so the movement history stays complete.
    ///
    /// [`apply_adjustment`]: LedgerRepository::apply_adjustment
    pub async fn set_on_hand(
        &self,
        warehouse_id: &str,
        product_id: &str,
        on_hand: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO warehouse_stock (warehouse_id, product_id, on_hand, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET
                on_hand = excluded.on_hand,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(on_hand)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
