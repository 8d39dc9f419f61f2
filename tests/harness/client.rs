//! TestClient - WebSocket client for driving dashboard connections

#![allow(dead_code)]

use std::time::Duration;

use anyhow::{bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::server::TestServer;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket test client
pub struct TestClient {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
    connection_id: String,
}

impl TestClient {
    /// Connect and consume the welcome message
    pub async fn connect(server: &TestServer) -> Result<Self> {
        let (ws_stream, _) = connect_async(server.ws_url()).await?;
        let (write, read) = ws_stream.split();

        let mut client = Self {
            write,
            read,
            connection_id: String::new(),
        };

        let welcome = client.recv_json_timeout(Duration::from_secs(5)).await?;
        if welcome["type"] != "welcome" {
            bail!("Expected welcome, got {}", welcome);
        }
        client.connection_id = welcome["connection_id"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(client)
    }

    /// Connection id from the welcome message
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Send a JSON message
    pub async fn send(&mut self, msg: Value) -> Result<()> {
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    bail!("WebSocket closed");
                }
                Some(Err(e)) => bail!("WebSocket error: {}", e),
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Wait for a message of a specific type
    pub async fn expect(&mut self, msg_type: &str) -> Result<Value> {
        self.expect_timeout(msg_type, Duration::from_secs(5)).await
    }

    /// Wait for a message of a specific type with timeout
    pub async fn expect_timeout(&mut self, msg_type: &str, timeout: Duration) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                bail!("Timeout waiting for message type '{}'", msg_type);
            }

            let msg = self.recv_json_timeout(remaining).await?;
            if msg["type"] == msg_type {
                return Ok(msg);
            }
        }
    }

    /// Collect everything that arrives within a short window
    pub async fn drain(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(Ok(msg)) =
            tokio::time::timeout(Duration::from_millis(200), self.recv_json()).await
        {
            messages.push(msg);
        }
        messages
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}
