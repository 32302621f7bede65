//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, frame
//! decoding into commands, and the write task feeding the socket.

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::error::AppError;
use crate::message::{InboundCommand, OutboundEvent};
use crate::router::ActionRouter;
use crate::server::RelayState;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, runs the action router until the
/// client goes away or sends a malformed payload, then removes the client
/// from every room.
pub async fn handle_connection(stream: TcpStream, state: RelayState) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Channel for relay -> client events
    let (event_tx, mut event_rx) = mpsc::channel::<OutboundEvent>(state.outbound_buffer);
    let client = Client::new(client_id, event_tx);
    let eviction = client.eviction();
    let router = ActionRouter::new(client, state.directory.clone(), state.queue.clone());

    // Spawn write task (OutboundEvent -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended for client");

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    let commands = decode_commands(client_id, ws_receiver);

    let ended = tokio::select! {
        result = router.run(commands) => {
            match result {
                Ok(()) => debug!("Client {} closed the stream", client_id),
                Err(e) => warn!("Closing connection {}: {}", client_id, e),
            }
            Ended::Reader
        }
        result = &mut write_task => {
            match result {
                Ok(()) => debug!("Write task completed for {}", client_id),
                Err(e) => warn!("Write task for {} failed: {}", client_id, e),
            }
            Ended::Writer
        }
        _ = eviction.notified() => {
            warn!("Client {} evicted after a failed delivery", client_id);
            Ended::Evicted
        }
    };

    let removed = router.disconnect().await;
    debug!("Client {} removed from {} room(s)", client_id, removed);

    // Dropping the last sender lets the write task flush and close.
    drop(router);
    match ended {
        Ended::Writer => {}
        Ended::Reader => {
            if let Err(e) = write_task.await {
                warn!("Write task for {} failed: {}", client_id, e);
            }
        }
        Ended::Evicted => {
            // The peer stopped reading; flushing could block forever.
            write_task.abort();
        }
    }

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Which side of the connection finished first
enum Ended {
    Reader,
    Writer,
    Evicted,
}

/// Turn WebSocket frames into decoded commands
///
/// Only text frames carry commands. A frame that fails to decode is
/// yielded as an error so the router stops.
fn decode_commands<S>(
    client_id: ClientId,
    frames: S,
) -> impl Stream<Item = Result<InboundCommand, AppError>>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>,
{
    frames.filter_map(move |frame| async move {
        match frame {
            Ok(Message::Text(text)) => Some(
                serde_json::from_str::<InboundCommand>(&text).map_err(|e| {
                    warn!("Invalid JSON from {}: {}", client_id, e);
                    AppError::from(e)
                }),
            ),
            Ok(Message::Close(_)) => {
                debug!("Client {} sent close frame", client_id);
                None
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
            Ok(_) => {
                // Binary or other frame types - ignore
                None
            }
            Err(e) => Some(Err(AppError::from(e))),
        }
    })
}
