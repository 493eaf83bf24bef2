//! Per-connection read/write loop.
//!
//! Each WebSocket connection runs one task: it registers with the
//! connection registry, routes inbound text frames, drains its outbound
//! channel, and answers liveness bookkeeping. Registry removal happens on
//! every exit path, so a terminated or errored connection always goes
//! through the ordinary close handling.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::domain::{ConnId, Outbound};
use crate::ws::router;

/// Runs the read/write loop for a single WebSocket connection.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let conn_id = ConnId::new();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    state.registry.accept(conn_id, outbound_tx).await;
    tracing::info!(%conn_id, "ws connection opened");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming message from the peer.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        router::route_frame(&text, conn_id, &state.registry, &state.tags).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        state.registry.mark_alive(conn_id).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Directive from the registry.
            directive = outbound_rx.recv() => {
                match directive {
                    Some(Outbound::Frame(json)) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Probe) => {
                        if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Terminate) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    state.registry.remove(conn_id).await;
    tracing::info!(%conn_id, "ws connection closed");
}
