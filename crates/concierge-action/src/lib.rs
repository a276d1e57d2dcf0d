//! Action layer for Concierge.
//!
//! Derives follow-up views for an intent, builds typed directives, and
//! dispatches each interpreted message to exactly one intent handler.

pub mod directive;
pub mod error;
pub mod extra_intents;
pub mod handler;
pub mod registry;

pub use directive::{DirectiveBuilder, DEFAULT_SUGGESTIONS};
pub use error::ActionError;
pub use extra_intents::extra_intents;
pub use handler::{HandlerContext, IntentHandler, Responder};
pub use registry::HandlerRegistry;
