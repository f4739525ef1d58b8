//! Agent runtime - the natural-language query pipeline and restock flow
//!
//! This crate composes the core domain with the store, completer, and chat
//! capabilities:
//! 1. **Schema snapshot** (`snapshot`) - live schema text for prompts
//! 2. **Translation** (`translator`) - question → candidate SQL via the completer
//! 3. **Gating and execution** (`pipeline`) - safety gate, query runner, and
//!    the single catch boundary that turns failures into a plain apology
//! 4. **Localization** (`localization`) - optional target-language rewrite
//! 5. **Restock flow** (`monitor`, `approval`) - low-stock alerts and the
//!    approve/reject decision over the shared pending slot
//!
//! # Safety Principle
//!
//! The completer is strictly a translator. Its output is untrusted
//! `CandidateSql` and only executes after the safety gate re-types it.

pub mod approval;
pub mod llm;
pub mod localization;
pub mod monitor;
pub mod pipeline;
pub mod snapshot;
pub mod translator;

pub use approval::{ApprovalController, ApprovalOutcome};
pub use llm::{HttpTextCompleter, TextCompleter};
pub use localization::ReplyLocalizer;
pub use monitor::{AlertOutcome, StockAlertMonitor};
pub use pipeline::{QueryPipeline, QueryRunner};
pub use snapshot::SchemaSnapshotter;
pub use translator::SqlTranslator;
