//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine Operation                                                      │
//! │       │                                                                 │
//! │       │  db.counts().get_items(count_id)                               │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CountRepository / LedgerRepository                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Convention
//!
//! Write methods are associated functions taking `&mut SqliteConnection`;
//! the engine opens one transaction per mutating operation and threads its
//! connection through every write it needs, so partial writes can never be
//! observed. Plain reads go through pool-backed `&self` methods.
//!
//! ## Available Repositories
//!
//! - [`count::CountRepository`] - Count session store (sessions + item lines)
//! - [`ledger::LedgerRepository`] - Stock ledger adapter (on-hand, values, adjustments)

pub mod count;
pub mod ledger;
