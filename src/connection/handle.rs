//! Module `handle`
//!
//! Defines `ClientHandle`, the server's view of one accepted connection:
//! its identity, the display name fixed by the handshake and the outbound
//! half of the socket.

use std::io;
use std::net::{Shutdown, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::error::FrameError;
use crate::protocol::{Message, write_frame};

pub type ClientId = u64;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

pub struct ClientHandle {
    id: ClientId,
    peer_addr: SocketAddr,
    name: OnceLock<String>,
    writer: Mutex<OwnedWriteHalf>,
    // Duplicate of the socket kept only to shut it down from other tasks,
    // which wakes the handler's pending read with end-of-stream.
    socket: std::net::TcpStream,
}

impl ClientHandle {
    /// Wraps an accepted stream. The read half goes to the connection handler.
    pub fn from_stream(stream: TcpStream) -> io::Result<(Arc<Self>, OwnedReadHalf)> {
        let peer_addr = stream.peer_addr()?;

        let std_stream = stream.into_std()?;
        let socket = std_stream.try_clone()?;
        let stream = TcpStream::from_std(std_stream)?;
        let (read_half, write_half) = stream.into_split();

        let handle = Arc::new(Self {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            peer_addr,
            name: OnceLock::new(),
            writer: Mutex::new(write_half),
            socket,
        });

        Ok((handle, read_half))
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Display name, once the handshake has completed.
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Fixes the display name. Returns false if it was already set.
    pub fn set_name(&self, name: String) -> bool {
        self.name.set(name).is_ok()
    }

    /// Name for log lines, falling back to the peer address before the handshake.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.peer_addr.to_string(),
        }
    }

    /// Writes one message frame to this client.
    pub async fn send(&self, message: &Message) -> Result<(), FrameError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, message.rendered()).await
    }

    /// Writes an already encoded frame to this client.
    pub async fn send_encoded(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await
    }

    /// Shuts the connection down in both directions. Safe to call repeatedly.
    pub fn close(&self) {
        let _ = self.socket.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tokio::net::TcpListener;

    /// A server-side handle plus its read half and the peer's end of the socket.
    pub async fn connected_handle() -> (Arc<ClientHandle>, OwnedReadHalf, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = TcpStream::connect(addr).await.unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        let (handle, read_half) = ClientHandle::from_stream(accepted).unwrap();
        (handle, read_half, peer)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::connected_handle;
    use crate::protocol::read_frame;

    #[tokio::test]
    async fn test_name_is_set_once() {
        let (handle, _read, _peer) = connected_handle().await;
        assert_eq!(handle.name(), None);
        assert_eq!(handle.label(), handle.peer_addr().to_string());

        assert!(handle.set_name("ana".into()));
        assert!(!handle.set_name("bob".into()));
        assert_eq!(handle.name(), Some("ana"));
        assert_eq!(handle.label(), "ana");
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let (a, _ra, _pa) = connected_handle().await;
        let (b, _rb, _pb) = connected_handle().await;
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_send_and_close() {
        let (handle, _read, mut peer) = connected_handle().await;
        handle
            .send(&crate::protocol::Message::notice("hello"))
            .await
            .unwrap();
        assert_eq!(read_frame(&mut peer).await.unwrap(), "Server: hello");

        handle.close();
        handle.close();
        assert!(read_frame(&mut peer).await.is_err());
        assert!(
            handle
                .send(&crate::protocol::Message::notice("gone"))
                .await
                .is_err()
        );
    }
}
