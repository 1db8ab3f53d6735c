use log::{error, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::ServerSettings;
use crate::connection::{ClientHandle, ClientId, ClientRegistry, handle_connection};
use crate::error::ServerError;
use crate::events::Notifier;
use crate::protocol::Message;

/// Every accepted connection, named or not, kept so `stop()` can close it.
type ConnectionMap = Arc<Mutex<HashMap<ClientId, Arc<ClientHandle>>>>;

struct Running {
    accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

pub struct Server {
    settings: ServerSettings,
    registry: ClientRegistry,
    connections: ConnectionMap,
    running: Mutex<Option<Running>>,
    notifier: Notifier,
}

impl Server {
    pub fn new(settings: ServerSettings, notifier: Notifier) -> Self {
        Self {
            settings,
            registry: ClientRegistry::new(notifier.clone()),
            connections: Arc::new(Mutex::new(HashMap::new())),
            running: Mutex::new(None),
            notifier,
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Address the listener is bound to, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Binds `port` and starts accepting. A no-op when already running.
    pub async fn start(&self, port: u16) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            self.notifier.line("Server is already running");
            return Ok(current.local_addr);
        }

        let bind_addr = self.settings.bind_socket(port);
        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.notifier.line(format!("Server error: {}", e));
                return Err(ServerError::Bind(bind_addr, e));
            }
        };
        let local_addr = listener.local_addr()?;
        self.notifier
            .line(format!("Server started on port {}", local_addr.port()));

        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.registry.clone(),
            Arc::clone(&self.connections),
            self.notifier.clone(),
        ));

        *running = Some(Running {
            accept_task,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Stops accepting and closes every open client connection.
    ///
    /// Closing the sockets is what ends each handler: its pending read
    /// returns end-of-stream and it runs its normal cleanup.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            self.notifier.line("Server is not running");
            return false;
        };

        // Aborting drops the listener, which closes the listening socket
        running.accept_task.abort();
        self.close_connections().await;

        if timeout(self.settings.stop_wait(), running.accept_task)
            .await
            .is_err()
        {
            warn!("Accept loop did not finish within {:?}", self.settings.stop_wait());
        }
        // anything accepted while the loop was being torn down
        self.close_connections().await;

        self.notifier.line("Server stopped successfully");
        true
    }

    async fn close_connections(&self) -> usize {
        let open: Vec<Arc<ClientHandle>> = self
            .connections
            .lock()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &open {
            handle.close();
        }
        open.len()
    }

    /// Operator message from the server console, sent to every client.
    pub async fn send_broadcast(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let message = Message::notice(text);
        self.registry.broadcast_except(&message, None).await;
        self.notifier.line(message.rendered());
    }
}

async fn accept_loop(
    listener: TcpListener,
    registry: ClientRegistry,
    connections: ConnectionMap,
    notifier: Notifier,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                log_connection(&stream, addr, &notifier);

                let (handle, read_half) = match ClientHandle::from_stream(stream) {
                    Ok(parts) => parts,
                    Err(e) => {
                        warn!("Failed to set up connection from {}: {}", addr, e);
                        continue;
                    }
                };
                connections
                    .lock()
                    .await
                    .insert(handle.id(), Arc::clone(&handle));

                let registry = registry.clone();
                let connections = Arc::clone(&connections);
                let notifier = notifier.clone();

                // Spawn a task for each client so accept loop doesn't block
                tokio::spawn(async move {
                    let id = handle.id();
                    handle_connection(handle, read_half, registry, notifier).await;
                    connections.lock().await.remove(&id);
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

fn log_connection(stream: &TcpStream, peer: SocketAddr, notifier: &Notifier) {
    match stream.local_addr() {
        Ok(local) => notifier.line(format!(
            "Client connected from: {} (Port: {}) → Server: {} (Port: {})",
            peer.ip(),
            peer.port(),
            local.ip(),
            local.port()
        )),
        Err(_) => notifier.line(format!("Client connected from: {}", peer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatEvent;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::time::sleep;

    fn loopback_settings() -> ServerSettings {
        ServerSettings {
            bind_address: "127.0.0.1".to_string(),
            ..ServerSettings::default()
        }
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_twice() {
        let (notifier, mut rx) = Notifier::channel();
        let server = Server::new(loopback_settings(), notifier);

        let addr = server.start(0).await.unwrap();
        assert!(server.is_running().await);
        assert_eq!(server.start(0).await.unwrap(), addr);
        assert_eq!(server.local_addr().await, Some(addr));

        assert!(server.stop().await);
        assert!(!server.is_running().await);
        assert!(!server.stop().await);

        let lines: Vec<String> = std::iter::from_fn(|| match rx.try_recv() {
            Ok(ChatEvent::LogLine(line)) => Some(line),
            _ => None,
        })
        .collect();
        assert_eq!(
            lines,
            vec![
                format!("Server started on port {}", addr.port()),
                "Server is already running".to_string(),
                "Server stopped successfully".to_string(),
                "Server is not running".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_closes_listening_socket() {
        let server = Server::new(loopback_settings(), Notifier::silent());
        let addr = server.start(0).await.unwrap();
        server.stop().await;

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_stop_closes_every_tracked_connection() {
        let server = Server::new(loopback_settings(), Notifier::silent());
        let addr = server.start(0).await.unwrap();

        let mut unnamed = TcpStream::connect(addr).await.unwrap();
        timeout(Duration::from_secs(5), async {
            while server.connections.lock().await.is_empty() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert!(server.stop().await);
        assert!(server.connections.lock().await.is_empty());
        assert_eq!(server.close_connections().await, 0);

        let mut buf = [0u8; 1];
        let read = timeout(Duration::from_secs(5), unnamed.read(&mut buf))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = Server::new(loopback_settings(), Notifier::silent());
        assert!(matches!(
            server.start(port).await,
            Err(ServerError::Bind(_, _))
        ));
        assert!(!server.is_running().await);
    }
}
