//! STOMP over TCP
//!
//! `StompConnector` opens one TCP connection per session and performs the
//! CONNECT/CONNECTED handshake. `StompSession` writes SEND frames and tears
//! the session down with a DISCONNECT that waits for its RECEIPT.
//!
//! Sessions live for a single publish, so no heart-beats are emitted after
//! the handshake; the negotiated intervals only tell the broker what to expect.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

use crate::transport::frame::{Frame, read_frame};
use crate::transport::{ConnectRequest, ConnectionListener, Connector, Headers, Session};
use crate::utils::MessagingError;

/// Headers the session sets itself; caller-supplied values for these are ignored.
const RESERVED_SEND_HEADERS: [&str; 2] = ["destination", "content-length"];

#[derive(Debug, Default, Clone, Copy)]
pub struct StompConnector;

pub struct StompSession {
    stream: BufStream<TcpStream>,
    addr: String,
    timeout: Duration,
    listener: Arc<dyn ConnectionListener>,
    connected: bool,
}

impl StompConnector {
    fn connect_frame(request: &ConnectRequest) -> Frame {
        let (send, receive) = request.heartbeat;
        let mut frame = Frame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", request.host.as_str())
            .header("heart-beat", format!("{send},{receive}"));
        if let Some((login, passcode)) = &request.credentials {
            frame = frame
                .header("login", login.as_str())
                .header("passcode", passcode.as_str());
        }
        for (key, value) in &request.headers {
            frame = frame.header(key.as_str(), value.as_str());
        }
        frame
    }
}

#[async_trait]
impl Connector for StompConnector {
    type Session = StompSession;

    async fn connect(
        &self,
        request: &ConnectRequest,
        listener: Arc<dyn ConnectionListener>,
    ) -> Result<StompSession, MessagingError> {
        let addr = request.address();
        let stream = match timeout(request.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(MessagingError::connect_failed(addr, e)),
            Err(_) => return Err(MessagingError::connect_failed(addr, "connection timed out")),
        };

        let mut session = StompSession {
            stream: BufStream::new(stream),
            addr,
            timeout: request.timeout,
            listener,
            connected: false,
        };

        session
            .write_frame(&Self::connect_frame(request))
            .await
            .map_err(|e| MessagingError::connect_failed(session.addr.clone(), e))?;

        match session.next_frame().await? {
            Some(frame) if frame.command == "CONNECTED" => {
                session.connected = true;
                Ok(session)
            }
            Some(frame) if frame.command == "ERROR" => {
                session.listener.on_error(&frame);
                let reason = frame
                    .get("message")
                    .unwrap_or("broker rejected the connection")
                    .to_string();
                Err(MessagingError::connect_failed(session.addr.clone(), reason))
            }
            Some(frame) => Err(MessagingError::connect_failed(
                session.addr.clone(),
                format!("expected CONNECTED, got {}", frame.command),
            )),
            None => {
                session.listener.on_disconnected();
                Err(MessagingError::connect_failed(
                    session.addr.clone(),
                    "connection closed during handshake",
                ))
            }
        }
    }
}

impl StompSession {
    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.stream.write_all(&frame.encode()).await?;
        self.stream.flush().await
    }

    /// Next frame within the session timeout. Transport trouble is a connect failure.
    async fn next_frame(&mut self) -> Result<Option<Frame>, MessagingError> {
        match timeout(self.timeout, read_frame(&mut self.stream)).await {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Err(MessagingError::Protocol(e.to_string()))
            }
            Ok(Err(e)) => Err(MessagingError::connect_failed(self.addr.clone(), e)),
            Err(_) => Err(MessagingError::connect_failed(
                self.addr.clone(),
                "timed out waiting for the broker",
            )),
        }
    }
}

#[async_trait]
impl Session for StompSession {
    async fn send(
        &mut self,
        destination: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<(), MessagingError> {
        let mut frame = Frame::new("SEND").header("destination", destination);
        for (key, value) in headers {
            if !RESERVED_SEND_HEADERS.contains(&key.as_str()) {
                frame = frame.header(key.as_str(), value.as_str());
            }
        }
        let frame = frame.with_body(body);

        self.write_frame(&frame)
            .await
            .map_err(|source| MessagingError::Send {
                destination: destination.to_string(),
                source,
            })
    }

    async fn disconnect(&mut self) -> Result<(), MessagingError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;

        let receipt = format!("disconnect-{}", Uuid::new_v4());
        self.write_frame(&Frame::new("DISCONNECT").header("receipt", receipt.as_str()))
            .await
            .map_err(|e| MessagingError::connect_failed(self.addr.clone(), e))?;

        let result = loop {
            match self.next_frame().await {
                Ok(Some(frame)) if frame.command == "RECEIPT" => {
                    if frame.get("receipt-id") == Some(receipt.as_str()) {
                        break Ok(());
                    }
                }
                Ok(Some(frame)) if frame.command == "ERROR" => self.listener.on_error(&frame),
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.listener.on_disconnected();
                    break Err(MessagingError::connect_failed(
                        self.addr.clone(),
                        "connection closed before DISCONNECT receipt",
                    ));
                }
                Err(e) => break Err(e),
            }
        };

        let _ = self.stream.shutdown().await;
        result
    }
}
