//! # Lifecycle Controller
//!
//! The count session state machine and the validation commit.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Count Lifecycle                                    │
//! │                                                                         │
//! │                 start           complete          validate              │
//! │   planned ──────────► in_progress ──────► completed ──────► validated  │
//! │      │                    │                                 (terminal)  │
//! │      │ cancel             │ cancel                                      │
//! │      └────────┬───────────┘                                             │
//! │               ▼                                                         │
//! │           cancelled (terminal)                                          │
//! │                                                                         │
//! │  Editable (items may change): planned, in_progress                     │
//! │  Every other transition attempt → InvalidState, no side effect         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each transition is a status-guarded conditional UPDATE: the new status
//! lands only if the row still holds an allowed predecessor. Zero rows
//! affected means another editor got there first (or the id is unknown) -
//! the loser sees a typed error and nothing was written.

use tracing::{debug, info, warn};

use tally_core::{CoreError, CountStatus, StockCount};
use tally_db::{CountRepository, DbError, LedgerRepository};

use crate::engine::CountEngine;
use crate::error::{EngineError, EngineResult};

impl CountEngine {
    /// Moves a planned count into `in_progress`.
    pub async fn start(&self, count_id: &str) -> EngineResult<StockCount> {
        self.transition(count_id, CountStatus::InProgress, &[CountStatus::Planned], "start")
            .await
    }

    /// Moves an in-progress count into `completed`.
    ///
    /// From here item lines are read-only; the count awaits `validate`.
    pub async fn complete(&self, count_id: &str) -> EngineResult<StockCount> {
        self.transition(
            count_id,
            CountStatus::Completed,
            &[CountStatus::InProgress],
            "complete",
        )
        .await
    }

    /// Abandons a count. Legal from `planned` and `in_progress`; never
    /// touches the ledger.
    pub async fn cancel(&self, count_id: &str) -> EngineResult<StockCount> {
        self.transition(
            count_id,
            CountStatus::Cancelled,
            &[CountStatus::Planned, CountStatus::InProgress],
            "cancel",
        )
        .await
    }

    /// Validates a completed count: commits every discrepancy to the stock
    /// ledger and moves the count to `validated`, atomically.
    ///
    /// ## What Happens Inside One Transaction
    /// 1. Status-guarded flip `completed → validated`. This is also the
    ///    concurrency guard: of two concurrent validators, exactly one
    ///    observes `completed`; the other fails with `InvalidState`.
    /// 2. For every line with `difference() != 0`, a signed adjustment
    ///    movement (reference = this count) and a delta update of the
    ///    on-hand quantity.
    /// 3. Commit. A failure anywhere - including the ledger writes - rolls
    ///    everything back: the count stays `completed`, the ledger untouched.
    ///
    /// ## Errors
    /// - `NotFound` - unknown session
    /// - `InvalidState` - session is not `completed`
    /// - `LedgerError` - an adjustment failed; transaction rolled back
    pub async fn validate(&self, count_id: &str) -> EngineResult<StockCount> {
        debug!(count_id = %count_id, "validate");

        let mut tx = self.db().begin().await?;

        let flipped = CountRepository::transition(
            &mut tx,
            count_id,
            CountStatus::Validated,
            &[CountStatus::Completed],
        )
        .await?;
        if !flipped {
            return Err(self.transition_failure(&mut tx, count_id, "validate").await?);
        }

        let count = Self::fetch_count(&mut tx, count_id).await?;
        let items = CountRepository::fetch_items(&mut tx, count_id).await?;

        let mut adjustments = 0usize;
        for item in &items {
            let difference = item.difference();
            if difference == 0 {
                continue;
            }

            LedgerRepository::apply_adjustment(
                &mut tx,
                &count.warehouse_id,
                &item.product_id,
                difference,
                count_id,
            )
            .await
            .map_err(|source| {
                warn!(
                    count_id = %count_id,
                    product_id = %item.product_id,
                    error = %source,
                    "Ledger adjustment failed, rolling back validation"
                );
                EngineError::Ledger {
                    count_id: count_id.to_string(),
                    source,
                }
            })?;
            adjustments += 1;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            count_id = %count_id,
            count_number = %count.count_number,
            items = items.len(),
            adjustments,
            "Stock count validated"
        );
        Ok(count)
    }

    /// Shared guarded transition for the ledger-free moves.
    async fn transition(
        &self,
        count_id: &str,
        to: CountStatus,
        allowed_from: &[CountStatus],
        operation: &'static str,
    ) -> EngineResult<StockCount> {
        debug!(count_id = %count_id, to = %to, operation, "transition");

        let mut tx = self.db().begin().await?;

        let flipped = CountRepository::transition(&mut tx, count_id, to, allowed_from).await?;
        if !flipped {
            return Err(self.transition_failure(&mut tx, count_id, operation).await?);
        }

        let count = Self::fetch_count(&mut tx, count_id).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(count_id = %count_id, status = %count.status, "Count status changed");
        Ok(count)
    }

    /// Distinguishes "no such count" from "wrong status" after a guarded
    /// UPDATE affected zero rows. Always returns the error to raise.
    async fn transition_failure(
        &self,
        conn: &mut sqlx::SqliteConnection,
        count_id: &str,
        operation: &'static str,
    ) -> Result<EngineError, EngineError> {
        let count = CountRepository::fetch_by_id(conn, count_id)
            .await?
            .ok_or_else(|| CoreError::CountNotFound(count_id.to_string()))?;

        Ok(CoreError::InvalidCountStatus {
            count_id: count.id,
            status: count.status,
            operation,
        }
        .into())
    }
}
