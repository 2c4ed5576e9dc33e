//! Mock feed server for integration tests.
//!
//! Provides a WebSocket server that:
//! - Accepts connections and counts them
//! - Records every text message received
//! - Pushes scripted frames once a client has sent its intents
//! - Optionally closes the first connection after pushing

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Intents a client sends before frames are pushed.
const INTENTS_PER_CONNECTION: usize = 3;

/// Server behaviour.
#[derive(Debug, Clone, Default)]
pub struct MockFeedScript {
    /// Frames pushed on every connection.
    pub frames: Vec<String>,
    /// Close the first connection once its frames are pushed.
    pub close_first_connection: bool,
}

struct Shared {
    script: MockFeedScript,
    messages: Mutex<Vec<String>>,
    connections: Mutex<u32>,
}

/// A mock feed server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    shared: Arc<Shared>,
}

impl MockWsServer {
    /// Start a new mock server on an available port.
    pub async fn start(script: MockFeedScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared {
            script,
            messages: Mutex::new(Vec::new()),
            connections: Mutex::new(0),
        });
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let shared_clone = shared.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(stream, shared_clone.clone()));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            shared,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get the number of connections received.
    pub async fn connection_count(&self) -> u32 {
        *self.shared.connections.lock().await
    }

    /// Get all received messages, across connections, in arrival order.
    pub async fn received_messages(&self) -> Vec<String> {
        self.shared.messages.lock().await.clone()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<Shared>) {
    let connection_no = {
        let mut count = shared.connections.lock().await;
        *count += 1;
        *count
    };

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let mut intents = 0usize;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                shared.messages.lock().await.push(text);
                intents += 1;
                if intents != INTENTS_PER_CONNECTION {
                    continue;
                }

                for frame in &shared.script.frames {
                    if write.send(Message::Text(frame.clone())).await.is_err() {
                        return;
                    }
                }

                if shared.script.close_first_connection && connection_no == 1 {
                    let close = CloseFrame {
                        code: CloseCode::Away,
                        reason: "maintenance".into(),
                    };
                    let _ = write.send(Message::Close(Some(close))).await;
                    return;
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockWsServer::start(MockFeedScript::default()).await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        server.shutdown().await;
    }
}
