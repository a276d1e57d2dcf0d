//! WebSocket transport for the duplex channel.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::ConnectionSupervisor;
use crate::envelope::Outbound;
use crate::state::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

async fn send(socket: &mut WebSocket, out: &Outbound) -> Result<(), axum::Error> {
    socket.send(Message::Text(out.to_json().into())).await
}

async fn run_connection(mut socket: WebSocket, state: AppState) {
    info!("Channel connection opened");
    let dispatcher = state.dispatcher.clone();
    let (tx, mut rx) = mpsc::channel(state.config.channel.outbound_buffer.max(1));
    let mut supervisor = ConnectionSupervisor::new();

    let (seen_reservations, seen_history) = match dispatcher.snapshot().await {
        Ok(snapshot) => {
            let seen = match &snapshot {
                Outbound::ReservationsUpdate {
                    reservations,
                    history,
                } => (
                    reservations.clone(),
                    history.as_ref().and_then(|h| h.first()).map(|e| e.id),
                ),
                _ => (Vec::new(), None),
            };
            if send(&mut socket, &snapshot).await.is_err() {
                return;
            }
            seen
        }
        Err(e) => {
            warn!(error = %e, "Snapshot failed");
            if send(&mut socket, &Outbound::error(e.to_string())).await.is_err() {
                return;
            }
            (Vec::new(), None)
        }
    };

    supervisor.spawn_pollers(
        dispatcher.store(),
        tx,
        &state.config.channel,
        seen_reservations,
        seen_history,
    );

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = dispatcher.handle_text(text.as_str()).await;
                    if send(&mut socket, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "Channel receive failed");
                    break;
                }
            },
            Some(out) = rx.recv() => {
                if send(&mut socket, &out).await.is_err() {
                    break;
                }
            }
        }
    }

    supervisor.shutdown().await;
    info!("Channel connection closed");
}
