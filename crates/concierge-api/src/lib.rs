//! Concierge API crate - duplex channel dispatcher and axum HTTP server.
//!
//! Each WebSocket connection gets a snapshot, then exchanges typed envelopes
//! with the dispatcher while per-connection pollers push reservation and
//! history updates. Plain HTTP routes expose health, statistics and a cache
//! reset.

pub mod automation;
pub mod connection;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use automation::{AutomationHub, LoggingAutomation};
pub use connection::ConnectionSupervisor;
pub use dispatcher::Dispatcher;
pub use envelope::{EnvelopeError, Inbound, Outbound};
pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
