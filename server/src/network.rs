//! Server network layer handling WebSocket connections and session coordination

use crate::config::ServerConfig;
use crate::registry::ConnectionId;
use crate::session::GameSession;
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        addr: SocketAddr,
        outbound: mpsc::Sender<String>,
        reply: oneshot::Sender<ConnectionId>,
    },
    FrameReceived {
        client_id: ConnectionId,
        text: String,
    },
    Disconnected {
        client_id: ConnectionId,
    },
}

/// Main server coordinating connections and the game session
///
/// Connection tasks never touch the session. They forward everything to the
/// main loop, which owns the session and handles one message at a time.
pub struct Server {
    listener: Arc<TcpListener>,
    local_addr: SocketAddr,
    session: GameSession,
    outbound_queue: usize,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Arc::new(listener),
            local_addr,
            session: GameSession::new(config.session_options()),
            outbound_queue: usize::from(config.outbound_queue),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns task that accepts connections, one task per client
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let server_tx = self.server_tx.clone();
        let outbound_queue = self.outbound_queue;

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            server_tx.clone(),
                            outbound_queue,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Applies one message to the session
    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected {
                addr,
                outbound,
                reply,
            } => {
                let client_id = self.session.connect(addr, outbound);
                if reply.send(client_id).is_err() {
                    // The connection task is gone before it learned its ID.
                    self.session.disconnect(client_id);
                }
            }
            ServerMessage::FrameReceived { client_id, text } => {
                debug!("Frame from client {}: {}", client_id, text);
                self.session.handle_frame(client_id, &text);
            }
            ServerMessage::Disconnected { client_id } => {
                self.session.disconnect(client_id);
            }
        }
    }

    /// Main server loop; runs until the process is stopped
    pub async fn run(&mut self) {
        self.spawn_acceptor();
        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            self.handle_message(message);
        }

        info!("Server shutting down");
    }
}

/// Drives one WebSocket connection: handshake, registration, then relaying
/// frames in both directions until either side goes away.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    outbound_queue: usize,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            error!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (sink, mut source) = ws_stream.split();

    let (outbound, outbound_rx) = mpsc::channel::<String>(outbound_queue);
    let (reply, reply_rx) = oneshot::channel();
    if server_tx
        .send(ServerMessage::Connected {
            addr,
            outbound,
            reply,
        })
        .is_err()
    {
        return;
    }
    let Ok(client_id) = reply_rx.await else {
        return;
    };

    let mut writer = tokio::spawn(write_frames(
        sink,
        outbound_rx,
        client_id,
        server_tx.clone(),
    ));

    loop {
        let message = tokio::select! {
            message = source.next() => message,
            // Write failure, or the session dropped this client.
            _ = &mut writer => break,
        };
        let Some(message) = message else {
            break;
        };
        match message {
            Ok(Message::Text(text)) => {
                if server_tx
                    .send(ServerMessage::FrameReceived { client_id, text })
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Client {} read error: {}", client_id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::Disconnected { client_id });
    writer.abort();
}

/// Drains the outbound queue into the socket.
///
/// A failed write reports the client as disconnected straight away so its
/// slot is released without waiting for the read side to notice.
async fn write_frames<S>(
    sink: S,
    mut outbound_rx: mpsc::Receiver<String>,
    client_id: ConnectionId,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) where
    S: Sink<Message>,
    S::Error: std::fmt::Display,
{
    tokio::pin!(sink);
    while let Some(frame) = outbound_rx.recv().await {
        if let Err(e) = sink.send(Message::Text(frame)).await {
            debug!("Send to client {} failed: {}", client_id, e);
            let _ = server_tx.send(ServerMessage::Disconnected { client_id });
            return;
        }
    }
    let _ = sink.close().await;
}
