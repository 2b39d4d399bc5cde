use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{interval, Duration};

use crate::{
    models::CurrentUser,
    services::realtime_hub::ClientMessage,
    AppState,
};

#[derive(Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

// GET /ws?token=<jwt>
//
// The token is verified before the upgrade; a connection without a valid
// identity never reaches the hub registry.
pub async fn ws_market(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<WsAuthQuery>,
) -> Response {
    let user = match crate::auth::verify_token(&state.settings, &q.token) {
        Ok(u) => u,
        Err(e) => return e.into_response(),
    };

    ws.on_upgrade(move |socket| handle_market_socket(socket, state, user))
}

async fn handle_market_socket(socket: WebSocket, state: AppState, user: CurrentUser) {
    let (session_id, mut rx) = state.hub.register(user.id);

    let (mut sender, mut receiver) = socket.split();

    // Ping browser to keep alive
    let mut ping = interval(Duration::from_secs(25));

    loop {
        tokio::select! {
            _ = ping.tick() => {
                if sender.send(Message::Ping(b"ping".to_vec())).await.is_err() {
                    break;
                }
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(msg) => {
                        let Ok(txt) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if sender.send(Message::Text(txt)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<ClientMessage>(&txt) {
                            Ok(ClientMessage::SubscribeSymbol { symbol }) => {
                                state.hub.subscribe(session_id, &symbol);
                            }
                            Ok(ClientMessage::UnsubscribeSymbol { symbol }) => {
                                state.hub.unsubscribe(session_id, &symbol);
                            }
                            Err(_) => {
                                tracing::debug!("ignoring malformed client message");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.hub.disconnect(session_id);
}
