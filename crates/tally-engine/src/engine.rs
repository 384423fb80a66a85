//! # Count Engine
//!
//! The `CountEngine` handle and shared operation plumbing.
//!
//! ## Transaction Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One Transaction Per Mutation                           │
//! │                                                                         │
//! │  engine.add_item(...)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx = db.begin()                                                        │
//! │       │                                                                 │
//! │       ├── fetch count        ── NotFound? return, tx drops (rollback)   │
//! │       ├── status editable?   ── InvalidState? return, tx drops          │
//! │       ├── write item line(s)                                            │
//! │       └── touch count                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.commit() ──► updated entity returned to the caller directly        │
//! │                                                                         │
//! │  Two concurrent editors never interleave a partial write: SQLite       │
//! │  serializes the write transactions, and every status check happens     │
//! │  inside the same transaction as the writes it guards.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;

use tally_core::{CoreError, CountStatus, StockCount, DEFAULT_TENANT_ID};
use tally_db::{CountRepository, Database};

use crate::error::EngineResult;

/// The inventory reconciliation engine.
///
/// Cheap to clone; every clone shares the underlying connection pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./tally.db")).await?;
/// let engine = CountEngine::new(db);
///
/// let count = engine.create_session(CreateCount {
///     warehouse_id,
///     count_date: None,
///     notes: None,
/// }).await?;
/// let report = engine.generate_items(&count.id, GenerateOptions::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CountEngine {
    db: Database,
    tenant_id: String,
}

impl CountEngine {
    /// Creates an engine for the default tenant.
    pub fn new(db: Database) -> Self {
        Self::with_tenant(db, DEFAULT_TENANT_ID)
    }

    /// Creates an engine scoped to one tenant.
    pub fn with_tenant(db: Database, tenant_id: impl Into<String>) -> Self {
        CountEngine {
            db,
            tenant_id: tenant_id.into(),
        }
    }

    /// The tenant this engine operates for.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The underlying database handle.
    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Loads a count inside the caller's transaction, or fails with
    /// `CountNotFound`.
    pub(crate) async fn fetch_count(
        conn: &mut SqliteConnection,
        count_id: &str,
    ) -> EngineResult<StockCount> {
        let count = CountRepository::fetch_by_id(conn, count_id)
            .await?
            .ok_or_else(|| CoreError::CountNotFound(count_id.to_string()))?;
        Ok(count)
    }

    /// Rejects the operation unless the count still accepts item edits.
    ///
    /// Editable = `planned` or `in_progress`. Called with the count row
    /// loaded in the same transaction as the writes it guards.
    pub(crate) fn ensure_editable(
        count: &StockCount,
        operation: &'static str,
    ) -> EngineResult<()> {
        if !count.status.is_editable() {
            return Err(CoreError::InvalidCountStatus {
                count_id: count.id.clone(),
                status: count.status,
                operation,
            }
            .into());
        }
        Ok(())
    }

    /// Loads a count for a read-only query, or fails with `CountNotFound`.
    pub(crate) async fn get_count(&self, count_id: &str) -> EngineResult<StockCount> {
        let count = self
            .db
            .counts()
            .get_by_id(count_id)
            .await?
            .ok_or_else(|| CoreError::CountNotFound(count_id.to_string()))?;
        Ok(count)
    }

    /// Lists this tenant's counts, newest first, optionally filtered by
    /// status.
    pub async fn list_sessions(
        &self,
        status: Option<CountStatus>,
        limit: u32,
    ) -> EngineResult<Vec<StockCount>> {
        Ok(self.db.counts().list(&self.tenant_id, status, limit).await?)
    }
}
