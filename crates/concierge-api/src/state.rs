//! Shared application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use concierge_chat::Interpreter;
use concierge_core::config::ConciergeConfig;
use concierge_nlu::MemoryProbe;
use concierge_storage::{Database, SqliteHotelStore};

use crate::automation::{AutomationHub, LoggingAutomation};
use crate::dispatcher::Dispatcher;

/// Cloned into every handler by axum; all fields are cheap `Arc` clones.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConciergeConfig>,
    pub interpreter: Arc<Interpreter>,
    pub dispatcher: Arc<Dispatcher>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ConciergeConfig,
        interpreter: Arc<Interpreter>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            interpreter,
            dispatcher,
            start_time: Instant::now(),
        }
    }

    /// Wire the interpreter and dispatcher to one SQLite database.
    pub fn from_database(
        config: ConciergeConfig,
        db: Arc<Database>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let store = Arc::new(SqliteHotelStore::new(db));
        let interpreter = Arc::new(Interpreter::new(&config, store.clone(), probe));
        let automation: Arc<dyn AutomationHub> = Arc::new(LoggingAutomation::default());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&interpreter),
            store.clone(),
            store,
            automation,
            config.channel.history_limit,
        ));
        Self::new(config, interpreter, dispatcher)
    }
}
