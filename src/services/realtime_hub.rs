//! In-memory registry of live client connections.
//!
//! Two independent routing namespaces: price updates go to sessions
//! subscribed to the symbol, alert notifications go to every session owned
//! by the user. Neither is persisted; state dies with the connection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::{AlertNotification, Quote};

pub type SessionId = u64;

/// Events a connected client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubscribeSymbol { symbol: String },
    UnsubscribeSymbol { symbol: String },
}

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PriceUpdate {
        symbol: String,
        quote: Quote,
        timestamp: i64,
    },
    PriceAlert {
        #[serde(flatten)]
        notification: AlertNotification,
        timestamp: i64,
    },
}

struct Session {
    user_id: ObjectId,
    tx: UnboundedSender<ServerMessage>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, Session>,
    by_owner: HashMap<ObjectId, HashSet<SessionId>>,
    by_symbol: HashMap<String, HashSet<SessionId>>,
}

pub struct RealtimeHub {
    next_id: AtomicU64,
    registry: RwLock<Registry>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Admit a verified connection. Returns the session id and the receiving
    /// half of its outbound channel; the transport task drains the receiver.
    pub fn register(&self, user_id: ObjectId) -> (SessionId, UnboundedReceiver<ServerMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut reg = self.registry.write();
        reg.sessions.insert(id, Session { user_id, tx });
        reg.by_owner.entry(user_id).or_default().insert(id);

        tracing::info!("session {id} connected for user {}", user_id.to_hex());
        (id, rx)
    }

    pub fn subscribe(&self, session: SessionId, symbol: &str) {
        let sym = symbol.trim().to_uppercase();
        if sym.is_empty() {
            return;
        }

        let mut reg = self.registry.write();
        if !reg.sessions.contains_key(&session) {
            return;
        }
        reg.by_symbol.entry(sym).or_default().insert(session);
    }

    pub fn unsubscribe(&self, session: SessionId, symbol: &str) {
        let sym = symbol.trim().to_uppercase();

        let mut reg = self.registry.write();
        if let Some(members) = reg.by_symbol.get_mut(&sym) {
            members.remove(&session);
            if members.is_empty() {
                reg.by_symbol.remove(&sym);
            }
        }
    }

    /// Drop a session from every index. Safe to call for sessions that never
    /// subscribed to anything, or that are already gone.
    pub fn disconnect(&self, session: SessionId) {
        let mut reg = self.registry.write();

        let Some(s) = reg.sessions.remove(&session) else {
            return;
        };

        if let Some(owned) = reg.by_owner.get_mut(&s.user_id) {
            owned.remove(&session);
            if owned.is_empty() {
                reg.by_owner.remove(&s.user_id);
            }
        }

        reg.by_symbol.retain(|_, members| {
            members.remove(&session);
            !members.is_empty()
        });

        tracing::info!("session {session} disconnected");
    }

    /// Deliver a quote to every session subscribed to `symbol`. Delivery is
    /// gated on subscription alone, not on watchlist ownership.
    pub fn push_price_update(&self, symbol: &str, quote: &Quote) {
        let sym = symbol.trim().to_uppercase();

        let msg = ServerMessage::PriceUpdate {
            symbol: sym.clone(),
            quote: quote.clone(),
            timestamp: Utc::now().timestamp(),
        };

        let reg = self.registry.read();
        let Some(members) = reg.by_symbol.get(&sym) else {
            return;
        };

        for id in members {
            if let Some(session) = reg.sessions.get(id) {
                let _ = session.tx.send(msg.clone());
            }
        }
    }

    /// Deliver an alert notification to every live session of `owner`,
    /// regardless of symbol subscriptions. No live session means the
    /// notification is dropped: delivery is at-most-once, best-effort.
    pub fn push_alert_notification(&self, owner: ObjectId, notification: AlertNotification) {
        let msg = ServerMessage::PriceAlert {
            notification,
            timestamp: Utc::now().timestamp(),
        };

        let reg = self.registry.read();
        let Some(members) = reg.by_owner.get(&owner) else {
            tracing::debug!("no live session for user {}, dropping alert", owner.to_hex());
            return;
        };

        for id in members {
            if let Some(session) = reg.sessions.get(id) {
                let _ = session.tx.send(msg.clone());
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.registry.read().sessions.len()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
