//! Conversational interpreter for Concierge.
//!
//! `Interpreter` owns the whole pipeline: normalization, the two cache tiers,
//! memory-aware intent resolution, entity extraction, follow-up intents and
//! handler dispatch.

pub mod orchestrator;
pub mod stats;

pub use orchestrator::{ChatOutcome, Interpreter};
pub use stats::InterpreterStats;
