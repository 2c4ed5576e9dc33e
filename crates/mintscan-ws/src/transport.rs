//! Transport abstraction for the feed socket.
//!
//! `ConnectionManager` drives the lifecycle through these traits so the
//! state machine can be exercised without a network:
//! - `TungsteniteTransport` opens real WebSocket connections
//! - tests plug in scripted sessions

use crate::error::{WsError, WsResult};
use crate::message::Frame;
use futures_util::{SinkExt, StreamExt};
use std::pin::Pin;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Opens feed sessions.
pub trait FeedTransport: Send + Sync {
    /// Open a session to `url`.
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, WsResult<Box<dyn FeedSession>>>;
}

/// An open feed connection.
pub trait FeedSession: Send {
    /// Send a text frame.
    fn send_text(&mut self, text: String) -> BoxFuture<'_, WsResult<()>>;

    /// Wait for the next inbound frame.
    ///
    /// `None` means the stream ended without a close frame.
    fn next_frame(&mut self) -> BoxFuture<'_, Option<WsResult<Frame>>>;

    /// Send a close frame.
    fn close(&mut self) -> BoxFuture<'_, WsResult<()>>;
}

/// WebSocket transport backed by tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteTransport;

impl FeedTransport for TungsteniteTransport {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, WsResult<Box<dyn FeedSession>>> {
        Box::pin(async move {
            // TCP_NODELAY on
            let (stream, _response) = connect_async_tls_with_config(url, None, true, None)
                .await
                .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
            Ok(Box::new(TungsteniteSession { stream }) as Box<dyn FeedSession>)
        })
    }
}

struct TungsteniteSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedSession for TungsteniteSession {
    fn send_text(&mut self, text: String) -> BoxFuture<'_, WsResult<()>> {
        Box::pin(async move {
            self.stream
                .send(Message::Text(text))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))
        })
    }

    fn next_frame(&mut self) -> BoxFuture<'_, Option<WsResult<Frame>>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text))),
                    Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                    Ok(Message::Ping(data)) => {
                        debug!("Received ping, sending pong");
                        if let Err(e) = self.stream.send(Message::Pong(data)).await {
                            return Some(Err(e.into()));
                        }
                    }
                    Ok(Message::Pong(_)) => {
                        debug!("Received pong");
                    }
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "Normal close".to_string()));
                        return Some(Ok(Frame::Close { code, reason }));
                    }
                    Ok(Message::Frame(_)) => {}
                    Err(e) => return Some(Err(e.into())),
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, WsResult<()>> {
        Box::pin(async move {
            self.stream
                .send(Message::Close(None))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))
        })
    }
}
