//! Concierge NLU crate - text normalization, intent resolution and entity extraction.
//!
//! Resolution is layered: a TTL cache, a keyword quick-route table, a
//! per-intent regex cascade, anchored shortcuts, and finally a naive Bayes
//! classifier trained at startup. A memory monitor decides when the whole
//! chain is replaced by a cheap keyword fallback.

pub mod cache;
pub mod classifier;
pub mod corpus;
pub mod extract;
pub mod matcher;
pub mod memory;
pub mod normalize;
pub mod quick_route;

pub use cache::{CacheStats, TtlCache};
pub use classifier::{ClassificationResult, IntentClassifier};
pub use extract::EntityOrchestrator;
pub use matcher::PatternMatcher;
pub use memory::{
    degraded_resolution, FixedMemoryProbe, MemoryLevel, MemoryMonitor, MemoryProbe, MemoryUsage,
    ProcessMemoryProbe,
};
pub use normalize::{normalize, Message, DEFAULT_MAX_CHARS};
pub use quick_route::quick_route;
