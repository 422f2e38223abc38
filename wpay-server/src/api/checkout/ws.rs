use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use wpay_sdk::objects::ws::{WsClientMessage, WsCloseCode, WsServerMessage};

use crate::state::AppState;

/// `GET /checkout/ws` – checkout session stream.
///
/// Upgrades the HTTP connection to a WebSocket that stands in for the
/// wallet modal. The first frame is the current modal visibility; after
/// that every session event is forwarded as a [`WsServerMessage`]. The
/// client may send `{"type":"dismiss"}` to close the modal.
pub(super) async fn session_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_session_ws(socket, app_state))
}

/// Background task that drives a single WebSocket connection.
async fn handle_session_ws(mut socket: WebSocket, state: AppState) {
    // Subscribe before reading the modal state so a change racing with
    // the first frame is still delivered.
    let mut events = state.orchestrator.events().subscribe();

    let hello = WsServerMessage::Modal {
        open: state.modal.is_open(),
    };
    if send_json(&mut socket, &hello).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        if send_json(&mut socket, &WsServerMessage::from(event)).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "WS: session event receiver lagged");
                        let msg = WsServerMessage::Modal {
                            open: state.modal.is_open(),
                        };
                        if send_json(&mut socket, &msg).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Closed) => {
                        break;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WsClientMessage>(text.as_str()) {
                            Ok(WsClientMessage::Dismiss) => {
                                let was_open = state.modal.dismiss();
                                tracing::debug!(was_open, "WS: modal dismissed by buyer");
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "WS: invalid client message");
                                let _ = send_json(
                                    &mut socket,
                                    &WsServerMessage::Error {
                                        code: WsCloseCode::INVALID_MESSAGE,
                                        reason: "invalid message".into(),
                                    },
                                )
                                .await;
                                let _ = socket
                                    .send(Message::Close(Some(CloseFrame {
                                        code: WsCloseCode::INVALID_MESSAGE,
                                        reason: "invalid message".into(),
                                    })))
                                    .await;
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return;
                    }
                    Some(Ok(_)) => {
                    }
                    Some(Err(_)) => {
                        return;
                    }
                }
            }
        }
    }

    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: WsCloseCode::GOING_AWAY,
            reason: "session stream closed".into(),
        })))
        .await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
