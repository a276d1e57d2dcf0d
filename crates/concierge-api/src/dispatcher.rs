//! Routes inbound envelopes to the interpreter, the reservation desk and the
//! automation hub. Every inbound frame produces exactly one outbound frame.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use concierge_chat::Interpreter;
use concierge_core::error::ConciergeError;
use concierge_core::records::{HistoryEntry, HistoryKind};
use concierge_storage::{HotelStore, ReservationCommand, ReservationDesk};

use crate::automation::AutomationHub;
use crate::envelope::{Inbound, Outbound};

pub struct Dispatcher {
    interpreter: Arc<Interpreter>,
    store: Arc<dyn HotelStore>,
    desk: Arc<dyn ReservationDesk>,
    automation: Arc<dyn AutomationHub>,
    history_limit: usize,
}

impl Dispatcher {
    pub fn new(
        interpreter: Arc<Interpreter>,
        store: Arc<dyn HotelStore>,
        desk: Arc<dyn ReservationDesk>,
        automation: Arc<dyn AutomationHub>,
        history_limit: usize,
    ) -> Self {
        Self {
            interpreter,
            store,
            desk,
            automation,
            history_limit,
        }
    }

    pub fn store(&self) -> Arc<dyn HotelStore> {
        Arc::clone(&self.store)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Parse one raw frame and answer it. Bad frames get an `ERROR` envelope.
    pub async fn handle_text(&self, raw: &str) -> Outbound {
        match Inbound::parse(raw) {
            Ok(inbound) => self.handle(inbound).await,
            Err(e) => {
                warn!(error = %e, "Rejected inbound envelope");
                Outbound::error(e.to_string())
            }
        }
    }

    pub async fn handle(&self, inbound: Inbound) -> Outbound {
        match inbound {
            Inbound::ChatMessage { content } => self.chat(content).await,
            Inbound::ReservationAction { action, data } => self.reservation(&action, data).await,
            Inbound::AutomationAction { action, data } => self.run_automation(&action, data).await,
        }
    }

    /// Initial state pushed to a new connection before any input is read.
    pub async fn snapshot(&self) -> Result<Outbound, ConciergeError> {
        let reservations = self.store.active_reservations().await?;
        let history = self.store.recent_history(self.history_limit).await?;
        Ok(Outbound::ReservationsUpdate {
            reservations,
            history: Some(history),
        })
    }

    async fn chat(&self, content: String) -> Outbound {
        let outcome = self.interpreter.respond(&content).await;
        let interpretation = outcome.interpretation;

        self.record(HistoryEntry::new(
            HistoryKind::Chat,
            content,
            Some(interpretation.intent.to_string()),
        ));

        Outbound::ChatResponse {
            response: outcome.directive,
            intent: interpretation.intent,
            entities: interpretation.entities,
            extra_intents: interpretation.extra_intents,
        }
    }

    async fn reservation(&self, action: &str, data: Value) -> Outbound {
        let result = match ReservationCommand::parse(action, data) {
            Ok(command) => self.desk.apply(command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(reservations) => {
                debug!(action = action, active = reservations.len(), "Reservation action applied");
                self.record(HistoryEntry::new(
                    HistoryKind::Reservation,
                    format!("Acțiune rezervare: {}", action),
                    None,
                ));
                Outbound::ReservationsUpdate {
                    reservations,
                    history: None,
                }
            }
            Err(e) => {
                warn!(action = action, error = %e, "Reservation action failed");
                Outbound::error(e.to_string())
            }
        }
    }

    async fn run_automation(&self, action: &str, data: Value) -> Outbound {
        let result = async {
            let summary = self.automation.trigger(action, data).await?;
            self.store
                .append_history(HistoryEntry::new(HistoryKind::Automation, summary, None))
                .await?;
            self.store.recent_history(self.history_limit).await
        }
        .await;

        match result {
            Ok(entries) => Outbound::History { entries },
            Err(e) => {
                warn!(action = action, error = %e, "Automation failed");
                Outbound::error(e.to_string())
            }
        }
    }

    /// Append a history entry without waiting; failures are only logged.
    fn record(&self, entry: HistoryEntry) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.append_history(entry).await {
                warn!(error = %e, "Failed to append history entry");
            }
        });
    }
}
