use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::tcp::OwnedReadHalf;

use crate::connection::{ClientHandle, ClientRegistry};
use crate::error::FrameError;
use crate::events::Notifier;
use crate::protocol::{Message, auto_response, check_content, is_exit, read_frame};

/// Drives one accepted connection from handshake to cleanup.
///
/// - The first frame is the display name; the client is then registered and
///   the others are told it joined.
/// - Every later frame is either `exit`, a rejected message, or a chat line
///   that is broadcast and possibly answered by the auto-responder.
/// - Cleanup runs on every exit path, graceful or not.
pub async fn handle_connection(
    handle: Arc<ClientHandle>,
    read_half: OwnedReadHalf,
    registry: ClientRegistry,
    notifier: Notifier,
) {
    let mut reader = BufReader::new(read_half);

    match run_session(&handle, &mut reader, &registry, &notifier).await {
        Ok(()) => info!("Client {} requested to exit", handle.label()),
        Err(FrameError::ConnectionClosed) => {
            info!("Connection closed by client {}", handle.peer_addr())
        }
        Err(e) => warn!("Client error ({}): {}", handle.peer_addr(), e),
    }

    cleanup(&handle, &registry, &notifier).await;
}

async fn run_session(
    handle: &Arc<ClientHandle>,
    reader: &mut BufReader<OwnedReadHalf>,
    registry: &ClientRegistry,
    notifier: &Notifier,
) -> Result<(), FrameError> {
    let name = read_frame(reader).await?;
    handle.set_name(name.clone());
    registry.add(Arc::clone(handle)).await;

    notifier.line(format!("{} joined the chat.", name));
    registry
        .broadcast_except(&Message::joined(&name), Some(handle.id()))
        .await;

    loop {
        let message = read_frame(reader).await?;

        if is_exit(&message) {
            return Ok(());
        }

        if let Err(violation) = check_content(&message) {
            debug!("{} from {}", violation, name);
            handle.send(&Message::rejection()).await?;
            notifier.line(format!("Blocked message from {}: {}", name, message));
            continue;
        }

        notifier.line(format!("{}: {}", name, message));
        registry
            .broadcast_except(&Message::chat(&name, &message), Some(handle.id()))
            .await;

        if let Some(response) = auto_response(&message, &name) {
            let reply = Message::notice(&response);
            handle.send(&reply).await?;
            notifier.line(reply.rendered());
        }
    }
}

async fn cleanup(handle: &ClientHandle, registry: &ClientRegistry, notifier: &Notifier) {
    if let Some(name) = handle.name() {
        registry
            .broadcast_except(&Message::left(name), Some(handle.id()))
            .await;
        notifier.line(format!("{} disconnected.", name));
    }

    registry.remove(handle).await;
    handle.close();
}
