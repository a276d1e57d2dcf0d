//! Entity extraction.
//!
//! Each extractor is a pure function from normalized text to an `EntityBag`;
//! the orchestrator picks which extractors run for a given intent and merges
//! their output.

pub mod contact;
pub mod dates;
pub mod orchestrator;
pub mod product;
pub mod room;

pub use concierge_core::types::EntityBag;
pub use orchestrator::{extractor_plan, EntityOrchestrator};
