//! services/client/src/collab/connection.rs
//!
//! An owned WebSocket connection to one document's collaboration room.
//!
//! A reader task parses incoming frames into `CollabEvent`s and forwards them
//! on a channel; outgoing commands go through a sink shared behind a mutex so
//! any number of `CollabSender`s can write. Dropping the connection cancels
//! the reader. There is no reconnection: when the socket goes away the event
//! stream simply ends.

use super::protocol::{CollabCommand, CollabEvent};
use crate::error::{ClientError, ClientResult};
use atticus_core::domain::Id;
use futures::{
    stream::{SplitSink, SplitStream, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::{
    net::TcpStream,
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// The room URL for a document, given the `ws://` or `wss://` origin.
pub fn collab_url(ws_base_url: &str, document_id: Id) -> String {
    format!("{}/ws/collab/{}/", ws_base_url.trim_end_matches('/'), document_id)
}

//=========================================================================================
// Sender
//=========================================================================================

/// A cloneable handle for sending commands on a connection.
#[derive(Clone)]
pub struct CollabSender {
    ws_sender: Arc<Mutex<WsSink>>,
}

impl CollabSender {
    pub async fn send(&self, command: &CollabCommand) -> ClientResult<()> {
        let json = serde_json::to_string(command)?;
        self.ws_sender.lock().await.send(Message::Text(json)).await?;
        Ok(())
    }
}

//=========================================================================================
// Connection
//=========================================================================================

pub struct CollabConnection {
    sender: CollabSender,
    events: mpsc::UnboundedReceiver<CollabEvent>,
    cancellation_token: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

impl CollabConnection {
    /// Opens the socket. `authorization` is the full header value, e.g.
    /// `Token abc`, for backends that authenticate the upgrade request.
    pub async fn connect(url: &str, authorization: Option<&str>) -> ClientResult<Self> {
        let mut request = url.into_client_request()?;
        if let Some(value) = authorization {
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Internal(format!("Invalid Authorization header: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (socket, response) = connect_async(request).await?;
        info!("Connected to {} ({}).", url, response.status());

        let (sink, stream) = socket.split();
        let (event_tx, events) = mpsc::unbounded_channel();
        let cancellation_token = CancellationToken::new();
        let reader = {
            let token = cancellation_token.clone();
            tokio::spawn(async move { reader_process(stream, event_tx, token).await })
        };

        Ok(Self {
            sender: CollabSender {
                ws_sender: Arc::new(Mutex::new(sink)),
            },
            events,
            cancellation_token,
            reader: Some(reader),
        })
    }

    pub fn sender(&self) -> CollabSender {
        self.sender.clone()
    }

    pub async fn send(&self, command: &CollabCommand) -> ClientResult<()> {
        self.sender.send(command).await
    }

    /// The next event, or `None` once the connection has ended.
    pub async fn next_event(&mut self) -> Option<CollabEvent> {
        self.events.recv().await
    }

    /// Sends a close frame and waits for the reader to stop.
    pub async fn close(mut self) -> ClientResult<()> {
        let result = self.sender.ws_sender.lock().await.close().await;
        self.cancellation_token.cancel();
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                error!("Collaboration reader panicked: {:?}", e);
            }
        }
        match result {
            Ok(()) => Ok(()),
            // The peer may already have gone.
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CollabConnection {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

/// Reads frames until the socket closes, the token is cancelled or nobody is
/// listening for events any more.
async fn reader_process(
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<CollabEvent>,
    cancellation_token: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancellation_token.cancelled() => {
                debug!("Collaboration reader cancelled.");
                return;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<CollabEvent>(&text) {
                Ok(event) => {
                    if events.send(event).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("Skipping malformed collaboration frame {:?}: {}", text, e),
            },
            // Keep polling so the close reply goes out; the stream ends next.
            Some(Ok(Message::Close(frame))) => {
                info!("Collaboration channel closed by server: {:?}", frame);
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("Collaboration channel error: {}", e);
                return;
            }
            None => {
                info!("Collaboration channel ended.");
                return;
            }
        }
    }
}
