//! WebSocket implementation of the realtime channel.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::{ChannelConnector, ChannelSink, ChannelStream};
use crate::error::SimError;
use crate::protocol::Envelope;

const CLIENT_HEADER: &str = "X-Sim-Client";
const CLIENT_NAME: &str = "simulation";

type WsTransport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials the backend websocket endpoint with a bearer token and the fixed
/// client identifier header.
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    /// `base_url` is the scheme+host part, e.g. `wss://backend.example.net`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(
        &self,
        path: &str,
        token: &str,
    ) -> Result<(Arc<dyn ChannelSink>, Box<dyn ChannelStream>), SimError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = url.as_str().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| SimError::Channel(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        request
            .headers_mut()
            .insert(CLIENT_HEADER, HeaderValue::from_static(CLIENT_NAME));

        let (transport, _) = connect_async(request).await?;
        debug!(url, "realtime channel connected");

        let (sink, stream) = transport.split();
        Ok((
            Arc::new(WsSink {
                inner: Mutex::new(sink),
            }),
            Box::new(WsStream { inner: stream }),
        ))
    }
}

/// Outbound half. The async mutex is the actor's write lock: every task
/// that sends on the channel goes through it, one frame at a time.
struct WsSink {
    inner: Mutex<SplitSink<WsTransport, Message>>,
}

#[async_trait]
impl ChannelSink for WsSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), SimError> {
        let text = envelope.to_text()?;
        let mut sink = self.inner.lock().await;
        sink.send(Message::Text(text)).await?;
        Ok(())
    }
}

struct WsStream {
    inner: SplitStream<WsTransport>,
}

#[async_trait]
impl ChannelStream for WsStream {
    async fn next(&mut self) -> Option<Result<String, SimError>> {
        // Skip non-text frames; close frames and errors end the stream.
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
