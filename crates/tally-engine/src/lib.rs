//! # tally-engine: Physical Inventory Reconciliation Engine
//!
//! The command/query boundary of Tally. UI pages, bulk-generation dialogs,
//! and export tooling all drive stock counts through this crate.
//!
//! ## What a Count Looks Like
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      A Stock Count, End to End                          │
//! │                                                                         │
//! │  create_session(warehouse)            → planned                        │
//! │       │                                                                 │
//! │  generate_items { include_zero_stock, overwrite, category? }           │
//! │  add_item / update_item_count / delete_item                            │
//! │       │                                                                 │
//! │  start()                              → in_progress                    │
//! │       │   ... operators count shelves, update_item_count ...           │
//! │       │   summary() / discrepancies() queryable at any time            │
//! │       │                                                                 │
//! │  complete()                           → completed (items frozen)       │
//! │       │                                                                 │
//! │  validate()                           → validated                      │
//! │       │   one transaction: status flip + one signed adjustment         │
//! │       │   movement per discrepant line, on-hand corrected to the       │
//! │       │   counted quantity                                             │
//! │       ▼                                                                 │
//! │  render_report(renderer)              → document for the caller        │
//! │                                                                         │
//! │  (cancel() from planned/in_progress abandons the count, no ledger      │
//! │   effect)                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - The [`CountEngine`] handle and transaction plumbing
//! - [`sessions`] - Session CRUD and manual item lines
//! - [`generator`] - Bulk item generation and auto-fill
//! - [`lifecycle`] - State machine and the validation commit
//! - [`summary`] - Reconciliation queries and the report hook
//! - [`error`] - [`EngineError`] and the caller-facing [`ErrorCode`]s
//!
//! ## Guarantees
//!
//! 1. Every mutating operation runs in exactly one database transaction
//! 2. Every state check happens inside the transaction it guards
//! 3. Mutations return the updated entity - callers never re-fetch
//! 4. `validate` is atomic across session store and stock ledger, and two
//!    concurrent validations of one count cannot both succeed

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod sessions;
pub mod summary;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::CountEngine;
pub use error::{EngineError, EngineResult, ErrorCode};
pub use sessions::{CreateCount, NewCountItem};
pub use summary::CountReportRenderer;
