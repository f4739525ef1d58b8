//! Stocky core - domain model for the inventory chat assistant
//!
//! This crate holds everything that does not perform I/O:
//! - **Configuration** (`config`) - layered config loading and validation
//! - **Errors** (`errors`) - the typed failure taxonomy of the query pipeline
//! - **Schema model** (`schema`) - live schema snapshots rendered for prompts
//! - **Safety gate** (`safety`) - read-only SQL policy over untrusted candidates
//! - **Formatting** (`format`) - chat-friendly rendering of result sets
//! - **Restock flow** (`restock`) - the pending refill request and its
//!   approve/reject state machine
//! - **Store capability** (`store`) - traits the database layer implements
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. Generated SQL is a `CandidateSql` and can
//! only become executable `SafeSql` by passing the safety gate.

pub mod config;
pub mod errors;
pub mod format;
pub mod restock;
pub mod rows;
pub mod safety;
pub mod schema;
pub mod store;

pub use errors::QueryError;
pub use format::format_result_set;
pub use restock::{ApprovalDecision, PendingRefillRequest, PendingSlot, RefillLine};
pub use rows::{QueryResultSet, Row};
pub use safety::{classify, CandidateSql, SafeSql, SafetyGate, StatementKind};
pub use schema::{ColumnInfo, SchemaDescription, TableInfo};
pub use store::{QueryExecutor, SchemaInspector};
