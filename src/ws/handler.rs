//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{Command, Direction};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ActionKind, ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let rate_limiter = ConnectionRateLimiter::new();
    let mut events_rx = state.session.subscribe();

    // Writer task: session broadcasts -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Don't disconnect for lag; the next snapshot supersedes
                    // anything missed
                    warn!(lagged_count = n, "Client lagged, skipping {} broadcasts", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> session command queue
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!("Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => {
                        let command = command_for(client_msg);
                        if state.session.command_tx.send(command).await.is_err() {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        // No-op by contract: bad intents are dropped, not errors
                        warn!(error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!("Client initiated close");
                break;
            }
            Err(e) => {
                error!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
    info!("WebSocket connection closed");
}

/// Map a parsed intent onto a session command
fn command_for(msg: ClientMsg) -> Command {
    match msg {
        ClientMsg::Join { player } => Command::Join { name: player },
        ClientMsg::Action { player, action } => match action {
            ActionKind::Up => Command::Move {
                name: player,
                direction: Direction::Up,
            },
            ActionKind::Down => Command::Move {
                name: player,
                direction: Direction::Down,
            },
            ActionKind::Shoot => Command::Shoot { name: player },
        },
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
