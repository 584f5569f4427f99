//! Websocket transport to the game server

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection is not open")]
    NotReady,
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Transport notifications for the UI thread
#[derive(Debug)]
pub enum NetworkEvent {
    Opened,
    Message(ServerMessage),
    Closed,
    Error(String),
}

enum Outbound {
    Text(String),
    Close,
}

/// One websocket to one endpoint. I/O runs on the tokio runtime; the
/// owning thread only sees `NetworkEvent`s and queues outgoing text.
pub struct Connection {
    state: ConnectionState,
    outbound: Option<UnboundedSender<Outbound>>,
}

impl Connection {
    /// Starts connecting in the background. The outcome arrives as
    /// `Opened` or `Error` on `events`; nothing is retried.
    pub fn connect(
        runtime: &Handle,
        endpoint: &str,
        events: UnboundedSender<NetworkEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let endpoint = endpoint.to_string();

        runtime.spawn(run_socket(endpoint, rx, events));

        Connection {
            state: ConnectionState::Connecting,
            outbound: Some(tx),
        }
    }

    /// A connection that never opens, for sessions without a server
    pub fn detached() -> Self {
        Connection {
            state: ConnectionState::Closed,
            outbound: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Folds a transport event into the connection state
    pub fn observe(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Opened => self.state = ConnectionState::Open,
            NetworkEvent::Closed | NetworkEvent::Error(_) => {
                self.state = ConnectionState::Closed;
                self.outbound = None;
            }
            NetworkEvent::Message(_) => {}
        }
    }

    pub fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        let outbound = match (&self.outbound, self.state) {
            (Some(outbound), ConnectionState::Open) => outbound,
            _ => return Err(ConnectionError::NotReady),
        };

        let text = serde_json::to_string(message)?;
        outbound
            .send(Outbound::Text(text))
            .map_err(|_| ConnectionError::NotReady)
    }

    pub fn disconnect(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
        self.state = ConnectionState::Closed;
    }
}

async fn run_socket(
    endpoint: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: UnboundedSender<NetworkEvent>,
) {
    let ws_stream = match connect_async(endpoint.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            error!("Failed to connect to {}: {}", endpoint, e);
            let _ = events.send(NetworkEvent::Error(e.to_string()));
            return;
        }
    };

    info!("Connected to {}", endpoint);
    let _ = events.send(NetworkEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ServerMessage::parse(&text) {
                    Ok(message) => {
                        if events.send(NetworkEvent::Message(message)).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dropping malformed server message: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Server closed connection");
                    let _ = events.send(NetworkEvent::Closed);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    let _ = events.send(NetworkEvent::Error(e.to_string()));
                    break;
                }
            },

            queued = outbound.recv() => match queued {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        error!("Failed to send message: {}", e);
                        let _ = events.send(NetworkEvent::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    debug!("Closing connection to {}", endpoint);
                    let _ = write.send(Message::Close(None)).await;
                    let _ = events.send(NetworkEvent::Closed);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    #[test]
    fn test_send_before_open_is_rejected() {
        let connection = Connection::detached();
        assert!(!connection.is_ready());
        assert!(matches!(
            connection.send(&ClientMessage::Stop),
            Err(ConnectionError::NotReady)
        ));
    }

    #[test]
    fn test_state_follows_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = Connection {
            state: ConnectionState::Connecting,
            outbound: Some(tx),
        };

        assert!(connection.send(&ClientMessage::Stop).is_err());

        connection.observe(&NetworkEvent::Opened);
        assert!(connection.is_ready());
        connection
            .send(&ClientMessage::Move {
                direction: Direction::Up,
            })
            .unwrap();

        match rx.try_recv() {
            Ok(Outbound::Text(text)) => {
                assert_eq!(text, r#"{"action":"move","direction":"up"}"#)
            }
            _ => panic!("Expected queued text"),
        }

        connection.observe(&NetworkEvent::Error("reset".to_string()));
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(connection.send(&ClientMessage::Stop).is_err());
    }

    #[test]
    fn test_disconnect_queues_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = Connection {
            state: ConnectionState::Open,
            outbound: Some(tx),
        };

        connection.disconnect();
        assert!(matches!(rx.try_recv(), Ok(Outbound::Close)));
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
