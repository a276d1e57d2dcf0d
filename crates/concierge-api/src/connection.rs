//! Per-connection background pollers.
//!
//! Each connection owns one supervisor. Pollers push into the connection's
//! outbound queue; `shutdown` cancels and joins them so nothing can send after
//! the connection is gone.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use concierge_core::config::ChannelConfig;
use concierge_core::records::Reservation;
use concierge_storage::HotelStore;

use crate::envelope::Outbound;

#[derive(Default)]
pub struct ConnectionSupervisor {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl ConnectionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run `task` until it finishes or the connection is cancelled.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        });
    }

    /// Start the reservation and history pollers, seeded with what the
    /// connection snapshot already showed.
    pub fn spawn_pollers(
        &mut self,
        store: Arc<dyn HotelStore>,
        tx: mpsc::Sender<Outbound>,
        config: &ChannelConfig,
        seen_reservations: Vec<Reservation>,
        seen_history: Option<Uuid>,
    ) {
        self.spawn(poll_reservations(
            Arc::clone(&store),
            tx.clone(),
            Duration::from_secs(config.reservation_poll_secs.max(1)),
            seen_reservations,
        ));
        self.spawn(poll_history(
            store,
            tx,
            Duration::from_secs(config.automation_poll_secs.max(1)),
            config.history_limit,
            seen_history,
        ));
    }

    /// Cancel every poller and wait for all of them to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Connection poller ended abnormally");
            }
        }
        debug!("Connection pollers stopped");
    }
}

async fn poll_reservations(
    store: Arc<dyn HotelStore>,
    tx: mpsc::Sender<Outbound>,
    period: Duration,
    mut last: Vec<Reservation>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let reservations = match store.active_reservations().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Reservation poll failed");
                continue;
            }
        };
        if reservations == last {
            continue;
        }
        last = reservations.clone();
        let update = Outbound::ReservationsUpdate {
            reservations,
            history: None,
        };
        if tx.send(update).await.is_err() {
            return;
        }
    }
}

async fn poll_history(
    store: Arc<dyn HotelStore>,
    tx: mpsc::Sender<Outbound>,
    period: Duration,
    limit: usize,
    mut newest: Option<Uuid>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let entries = match store.recent_history(limit).await {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "History poll failed");
                continue;
            }
        };
        let head = entries.first().map(|e| e.id);
        if head.is_none() || head == newest {
            continue;
        }
        newest = head;
        if tx.send(Outbound::History { entries }).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::records::{HistoryEntry, HistoryKind};
    use concierge_storage::{seed_demo_data, Database, SqliteHotelStore};

    fn store() -> Arc<SqliteHotelStore> {
        let db = Arc::new(Database::in_memory().unwrap());
        seed_demo_data(db.clone()).unwrap();
        Arc::new(SqliteHotelStore::new(db))
    }

    fn fast_config() -> ChannelConfig {
        ChannelConfig {
            reservation_poll_secs: 1,
            automation_poll_secs: 1,
            history_limit: 5,
            outbound_buffer: 8,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_poller_reports_new_entries() {
        let store = store();
        let (tx, mut rx) = mpsc::channel(8);
        let mut supervisor = ConnectionSupervisor::new();
        let seen = store.active_reservations().await.unwrap();
        supervisor.spawn_pollers(store.clone(), tx, &fast_config(), seen, None);
        assert_eq!(supervisor.len(), 2);

        store
            .append_history(HistoryEntry::new(HistoryKind::Automation, "audit", None))
            .await
            .unwrap();

        let out = rx.recv().await.unwrap();
        match out {
            Outbound::History { entries } => assert_eq!(entries[0].text, "audit"),
            other => panic!("unexpected envelope: {:?}", other),
        }
        supervisor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_reservations_are_not_resent() {
        let store = store();
        let (tx, mut rx) = mpsc::channel(8);
        let mut supervisor = ConnectionSupervisor::new();
        let seen = store.active_reservations().await.unwrap();
        supervisor.spawn(poll_reservations(
            store.clone(),
            tx,
            Duration::from_secs(1),
            seen,
        ));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_every_poller() {
        let store = store();
        let (tx, mut rx) = mpsc::channel(8);
        let mut supervisor = ConnectionSupervisor::new();
        let token = supervisor.token();
        supervisor.spawn_pollers(store, tx, &fast_config(), Vec::new(), None);

        supervisor.shutdown().await;
        assert!(token.is_cancelled());
        // All senders were dropped with their tasks.
        assert!(rx.recv().await.is_none());
    }
}
