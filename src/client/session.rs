//! Client session management
//!
//! Owns the outbound connection: validates the server address, probes it,
//! connects with a timeout, performs the handshake and then receives frames
//! until the connection drops. Every failure except a malformed address is
//! retried forever after a fixed delay.

use log::{debug, info};
use rand::Rng;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, PoisonError};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{sleep, timeout};

use crate::client::SessionState;
use crate::config::ClientSettings;
use crate::error::SessionError;
use crate::error::handlers::is_retryable;
use crate::events::Notifier;
use crate::protocol::{read_frame, write_frame};
use crate::utils::network::{check_reachable, parse_ipv4};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1";

/// Shared outbound half; `None` whenever the session is not connected.
type SharedWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// Client side of the chat. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct ChatClient {
    settings: ClientSettings,
    notifier: Notifier,
    writer: SharedWriter,
    state: Arc<watch::Sender<SessionState>>,
    cycle: Arc<std::sync::Mutex<Option<AbortHandle>>>,
}

impl ChatClient {
    pub fn new(settings: ClientSettings, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            settings,
            notifier,
            writer: Arc::new(Mutex::new(None)),
            state: Arc::new(state),
            cycle: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Starts the connect/retry cycle in the background.
    ///
    /// A blank address falls back to `127.0.0.1` and a blank name to a
    /// random `Client<n>`. The task only finishes on a terminal error or
    /// when a later `connect` replaces it.
    pub fn connect(&self, server_address: &str, display_name: &str) -> JoinHandle<SessionError> {
        let address = match server_address.trim() {
            "" => DEFAULT_SERVER_ADDRESS.to_string(),
            trimmed => trimmed.to_string(),
        };
        let name = match display_name.trim() {
            "" => format!("Client{}", rand::thread_rng().gen_range(0..1000)),
            _ => display_name.to_string(),
        };

        let cycle = SessionCycle {
            client: self.clone(),
            address,
            name,
        };

        let mut current = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            debug!("Replacing the running client session");
            previous.abort();
        }
        let task = tokio::spawn(cycle.run());
        *current = Some(task.abort_handle());
        task
    }

    /// Sends one chat line to the server.
    ///
    /// Blank text is ignored. Text sent while disconnected is lost. A failed
    /// send is reported but leaves the receive side alone.
    pub async fn send(&self, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        let result = match writer.as_mut() {
            Some(writer) => write_frame(writer, text).await.map_err(SessionError::from),
            None => Err(SessionError::NotConnected),
        };

        match &result {
            Ok(()) => self.notifier.line(format!("You: {}", text)),
            Err(e) => self.notifier.line(format!("Error sending message: {}", e)),
        }
        result
    }

    fn set_state(&self, state: SessionState) {
        debug!("Client session {}", state);
        self.state.send_replace(state);
        self.notifier.state(state);
    }

    async fn release(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
    }
}

struct SessionCycle {
    client: ChatClient,
    address: String,
    name: String,
}

impl SessionCycle {
    async fn run(self) -> SessionError {
        // drop whatever connection a replaced cycle left behind
        self.client.release().await;

        loop {
            let err = self.attempt().await;
            self.client.release().await;

            if !is_retryable(&err) {
                self.client
                    .notifier
                    .line("Invalid IP address format. Use format like 127.0.0.1");
                self.client.set_state(SessionState::Failed);
                return err;
            }

            self.report(&err);
            sleep(self.client.settings.retry_delay()).await;
        }
    }

    /// One pass through the cycle; always ends in the error that stopped it.
    async fn attempt(&self) -> SessionError {
        let settings = &self.client.settings;
        let notifier = &self.client.notifier;

        self.client.set_state(SessionState::Validating);
        let ip = match parse_ipv4(&self.address) {
            Ok(ip) => ip,
            Err(e) => return e,
        };

        self.client.set_state(SessionState::ProbingReachability);
        while let Err(e) =
            check_reachable(ip, settings.probe_port, settings.probe_timeout()).await
        {
            notifier.line(e.to_string());
            sleep(settings.retry_delay()).await;
        }

        self.client.set_state(SessionState::Connecting);
        notifier.line(format!("Trying to connect to {}...", ip));
        let stream = match self.open(ip).await {
            Ok(stream) => stream,
            Err(e) => return e,
        };

        let (read_half, mut write_half) = stream.into_split();
        if let Err(e) = write_frame(&mut write_half, &self.name).await {
            return e.into();
        }
        *self.client.writer.lock().await = Some(write_half);

        self.client.set_state(SessionState::Connected);
        notifier.line(format!("Connected to {} as {}", ip, self.name));

        let mut reader = BufReader::new(read_half);
        let err = loop {
            match read_frame(&mut reader).await {
                Ok(line) => notifier.line(line),
                Err(e) => break e,
            }
        };

        self.client.release().await;
        self.client.set_state(SessionState::Disconnected);
        err.into()
    }

    async fn open(&self, ip: Ipv4Addr) -> Result<TcpStream, SessionError> {
        let settings = &self.client.settings;
        let target = SocketAddr::from((ip, settings.port));

        match timeout(settings.connect_timeout(), TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                info!("Connected to {}", target);
                Ok(stream)
            }
            Ok(Err(e)) => Err(SessionError::Connect(target, e)),
            Err(_) => Err(SessionError::ConnectTimeout(target)),
        }
    }

    fn report(&self, err: &SessionError) {
        let notifier = &self.client.notifier;
        match err {
            SessionError::Connect(_, e) if e.kind() == ErrorKind::ConnectionRefused => {
                notifier.line(format!(
                    "Server not running at {}. Retrying in {} seconds...",
                    self.address,
                    self.client.settings.retry_delay().as_secs()
                ));
            }
            _ => notifier.line(format!("Connection error ({}): {}", self.address, err)),
        }
    }
}
