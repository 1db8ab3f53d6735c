//! Client registry
//!
//! Tracks every handle between "handshake complete" and "cleanup started"
//! and distributes messages to them.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::connection::{ClientHandle, ClientId};
use crate::events::Notifier;
use crate::protocol::{Message, encode};

/// Registry for tracking named, active clients. Cheap to clone.
#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<Mutex<HashMap<ClientId, Arc<ClientHandle>>>>,
    notifier: Notifier,
}

impl ClientRegistry {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            notifier,
        }
    }

    /// Registers `handle`; a handle that is already present is left as is.
    pub async fn add(&self, handle: Arc<ClientHandle>) {
        let mut clients = self.clients.lock().await;
        clients.entry(handle.id()).or_insert(handle);
        debug!("Active clients: {}", clients.len());
    }

    /// Removes `handle` if present. Returns whether it was registered.
    pub async fn remove(&self, handle: &ClientHandle) -> bool {
        let removed = self.clients.lock().await.remove(&handle.id()).is_some();
        if removed {
            self.notifier
                .line(format!("{} was removed from active clients", handle.label()));
        }
        removed
    }

    pub async fn contains(&self, id: ClientId) -> bool {
        self.clients.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Sends `message` to every registered client except `excluded`.
    ///
    /// The frame is encoded once up front; a message too large to frame is
    /// dropped and nobody is touched. Works on a snapshot so the lock is never
    /// held during I/O. A client whose write fails is dropped from the
    /// registry and the broadcast goes on with the rest. Returns the number
    /// of successful deliveries.
    pub async fn broadcast_except(&self, message: &Message, excluded: Option<ClientId>) -> usize {
        let frame = match encode(message.rendered()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Broadcast dropped: {}", e);
                return 0;
            }
        };

        let snapshot: Vec<Arc<ClientHandle>> = {
            let clients = self.clients.lock().await;
            clients
                .values()
                .filter(|handle| Some(handle.id()) != excluded)
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        for handle in snapshot {
            match handle.send_encoded(&frame).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Broadcast failed to {}: {}", handle.label(), e);
                    self.clients.lock().await.remove(&handle.id());
                }
            }
        }
        delivered
    }
}
