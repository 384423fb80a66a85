//! # Item Generator
//!
//! Bulk population of a count session from the stock ledger's current
//! snapshot.
//!
//! ## Generation Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      generate_items Flow                                │
//! │                                                                         │
//! │  1. Session editable? ──── no ──► InvalidState, nothing written        │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  2. Fetch on-hand per product for the session's warehouse              │
//! │     (active products, optional category filter)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. include_zero_stock=false? drop products with on_hand = 0           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. overwrite=true?  ── delete all existing lines, skip set = ∅        │
//! │     overwrite=false? ── skip set = products already in the session     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  5. Insert one line per remaining product:                             │
//! │     expected = ledger on-hand (frozen), counted = 0                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  6. Report { created, skipped }                                        │
//! │                                                                         │
//! │  Idempotent under overwrite=true (same ledger state → same lines),     │
//! │  additive-safe under overwrite=false (re-runs never duplicate).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use tally_core::validation::validate_optional_id;
use tally_core::{CoreError, GenerateOptions, GenerateReport, StockCountItem};
use tally_db::{CountRepository, DbError, LedgerRepository};

use crate::engine::CountEngine;
use crate::error::EngineResult;

impl CountEngine {
    /// Populates an editable session's item lines from the ledger snapshot.
    ///
    /// Unlike `add_item`, products already present are not an error: this is
    /// a bulk convenience, so they are skipped and reported in the result.
    ///
    /// ## Errors
    /// - `InvalidInput` - malformed category filter
    /// - `NotFound` - unknown session
    /// - `InvalidState` - session is no longer editable
    pub async fn generate_items(
        &self,
        count_id: &str,
        options: GenerateOptions,
    ) -> EngineResult<GenerateReport> {
        debug!(
            count_id = %count_id,
            include_zero_stock = options.include_zero_stock,
            overwrite = options.overwrite,
            category_id = ?options.category_id,
            "generate_items"
        );

        validate_optional_id("category_id", options.category_id.as_deref())
            .map_err(CoreError::from)?;

        let mut tx = self.db().begin().await?;

        let count = Self::fetch_count(&mut tx, count_id).await?;
        Self::ensure_editable(&count, "generate items")?;

        let entries = LedgerRepository::on_hand_for_warehouse(
            &mut tx,
            &count.warehouse_id,
            options.category_id.as_deref(),
        )
        .await?;

        let existing: HashSet<String> = if options.overwrite {
            CountRepository::delete_items(&mut tx, count_id).await?;
            HashSet::new()
        } else {
            CountRepository::item_product_ids(&mut tx, count_id)
                .await?
                .into_iter()
                .collect()
        };

        let now = Utc::now();
        let mut created = 0usize;
        let mut skipped = 0usize;

        for entry in entries {
            if !options.include_zero_stock && entry.on_hand == 0 {
                continue;
            }
            if existing.contains(&entry.product_id) {
                skipped += 1;
                continue;
            }

            let item = StockCountItem {
                id: Uuid::new_v4().to_string(),
                stock_count_id: count.id.clone(),
                product_id: entry.product_id,
                sku_snapshot: entry.sku,
                name_snapshot: entry.name,
                expected_quantity: entry.on_hand,
                counted_quantity: 0,
                notes: None,
                created_at: now,
                updated_at: now,
            };
            CountRepository::insert_item(&mut tx, &item).await?;
            created += 1;
        }

        CountRepository::touch(&mut tx, count_id).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count_id, created, skipped, "Count items generated");
        Ok(GenerateReport { created, skipped })
    }

    /// Bulk-fills every line's counted quantity from its expected quantity.
    ///
    /// A convenience for low-discrepancy stocktakes: fill everything, then
    /// correct only the lines that differ.
    ///
    /// ## Returns
    /// The number of lines updated.
    pub async fn auto_fill_counts(&self, count_id: &str) -> EngineResult<u64> {
        debug!(count_id = %count_id, "auto_fill_counts");

        let mut tx = self.db().begin().await?;

        let count = Self::fetch_count(&mut tx, count_id).await?;
        Self::ensure_editable(&count, "auto-fill counts")?;

        let updated = CountRepository::auto_fill(&mut tx, count_id).await?;
        CountRepository::touch(&mut tx, count_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count_id, updated, "Counted quantities auto-filled");
        Ok(updated)
    }
}
