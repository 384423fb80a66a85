//! # Summary Queries & Report Hook
//!
//! Read-side of the engine: reconciliation summaries, discrepancy lists,
//! and the export hook that hands a fully-loaded session to a renderer.
//!
//! Nothing here is cached: every query recomputes from the rows as they
//! are right now, so edits are visible immediately and a summary can never
//! go stale.

use tracing::debug;

use tally_core::{reconcile, CountSummary, StockCountItem, StockCountWithItems};

use crate::engine::CountEngine;
use crate::error::EngineResult;

// =============================================================================
// Report Hook
// =============================================================================

/// Renders a fully-loaded count session into some document format.
///
/// The engine owns loading and reconciliation math; collaborators own the
/// actual rendering (PDF, CSV, HTML - out of scope here). Implement this
/// and pass it to [`CountEngine::render_report`].
pub trait CountReportRenderer {
    type Output;

    /// Called with the session (items included, differences derivable) and
    /// its freshly computed summary.
    fn render(&self, session: &StockCountWithItems, summary: &CountSummary) -> Self::Output;
}

// =============================================================================
// Queries
// =============================================================================

impl CountEngine {
    /// Computes the reconciliation summary for a count.
    ///
    /// Statistics, quantity totals, and valuation totals are derived on
    /// demand from the current item lines and the ledger's unit values.
    pub async fn summary(&self, count_id: &str) -> EngineResult<CountSummary> {
        debug!(count_id = %count_id, "summary");

        // Existence check first so an unknown id is NotFound, not an empty
        // summary
        self.get_count(count_id).await?;

        let items = self.db().counts().get_items(count_id).await?;
        let unit_values = self.db().ledger().unit_values_for_count(count_id).await?;

        Ok(reconcile::summarize(&items, &unit_values))
    }

    /// Lists the item lines whose counted quantity disagrees with the
    /// expected one.
    pub async fn discrepancies(&self, count_id: &str) -> EngineResult<Vec<StockCountItem>> {
        debug!(count_id = %count_id, "discrepancies");

        self.get_count(count_id).await?;

        let items = self.db().counts().get_items(count_id).await?;
        Ok(reconcile::discrepancies(&items).into_iter().cloned().collect())
    }

    /// Loads a session with items and summary, then hands both to the
    /// renderer. The engine never interprets the output.
    pub async fn render_report<R: CountReportRenderer>(
        &self,
        count_id: &str,
        renderer: &R,
    ) -> EngineResult<R::Output> {
        debug!(count_id = %count_id, "render_report");

        let session = self.get_session(count_id).await?;
        let unit_values = self.db().ledger().unit_values_for_count(count_id).await?;
        let summary = reconcile::summarize(&session.items, &unit_values);

        Ok(renderer.render(&session, &summary))
    }
}
