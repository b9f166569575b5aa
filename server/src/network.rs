//! Server network layer handling TCP connections and the registration handshake
//!
//! One task is spawned per accepted connection, plus one writer task per
//! connection that drains a packet channel onto the socket. Handlers never
//! touch the turn state directly: everything the coordinator needs to know is
//! forwarded as a [`GameEvent`] over a single mpsc channel, which keeps turn
//! advancement single-writer.

use crate::game::GameCoordinator;
use crate::questions::Question;
use crate::registry::{RegisterOutcome, Registry};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};

/// Events forwarded from connection handlers to the turn coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined { nickname: String },
    AnswerReceived { nickname: String, text: String },
    PlayerLeft { nickname: String },
}

/// Main server owning the listener, the shared roster and the event channel.
pub struct Server {
    listener: TcpListener,
    registry: Arc<RwLock<Registry>>,
    event_tx: mpsc::UnboundedSender<GameEvent>,
    event_rx: mpsc::UnboundedReceiver<GameEvent>,
    questions: Vec<Question>,
    answer_timeout: Duration,
}

impl Server {
    /// Binds the listening socket. Bind failure is the only process-fatal
    /// error in the whole server.
    pub async fn new(
        addr: &str,
        questions: Vec<Question>,
        answer_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            registry: Arc::new(RwLock::new(Registry::new())),
            event_tx,
            event_rx,
            questions,
            answer_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever. The turn coordinator is spawned as its
    /// own task; each accepted connection gets a handler task and a unique
    /// connection id for disconnect matching.
    pub async fn run(self) {
        let Server {
            listener,
            registry,
            event_tx,
            event_rx,
            questions,
            answer_timeout,
        } = self;

        let coordinator =
            GameCoordinator::new(Arc::clone(&registry), questions, answer_timeout, event_rx);
        tokio::spawn(coordinator.run());

        let mut next_conn_id: u64 = 1;

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let conn_id = next_conn_id;
                    next_conn_id += 1;

                    let registry = Arc::clone(&registry);
                    let event_tx = event_tx.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, conn_id, registry, event_tx).await;
                    });
                }
                Err(e) => {
                    // Transient accept failures must not take the server down
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Drains the per-connection packet channel onto the socket, one JSON line
/// per packet. Ends when the channel closes (session reset or rejection) or
/// the socket breaks; either way the write half is dropped and the peer sees
/// the connection close.
async fn write_loop(mut write_half: OwnedWriteHalf, mut packet_rx: mpsc::UnboundedReceiver<Packet>) {
    while let Some(packet) = packet_rx.recv().await {
        let line = match shared::encode(&packet) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode packet: {}", e);
                continue;
            }
        };
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            debug!("Write failed, closing connection: {}", e);
            break;
        }
    }
}

/// Handles one connection end to end: nickname handshake, registration, then
/// forwarding every received line to the coordinator as an answer event.
///
/// All connection-level failures resolve to a disconnect plus a departure
/// broadcast; none of them propagate.
async fn handle_connection(
    stream: TcpStream,
    conn_id: u64,
    registry: Arc<RwLock<Registry>>,
    event_tx: mpsc::UnboundedSender<GameEvent>,
) {
    let (read_half, write_half) = stream.into_split();
    let (packet_tx, packet_rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(write_half, packet_rx));

    let mut lines = BufReader::new(read_half).lines();

    if packet_tx.send(Packet::NicknameRequest).is_err() {
        return;
    }

    let nickname = match lines.next_line().await {
        Ok(Some(line)) if !line.trim().is_empty() => line.trim().to_string(),
        Ok(_) => {
            debug!("Connection {} closed before registering", conn_id);
            return;
        }
        Err(e) => {
            debug!("Connection {} failed during handshake: {}", conn_id, e);
            return;
        }
    };

    {
        let mut registry = registry.write().await;
        match registry.register(&nickname, conn_id, packet_tx.clone()) {
            RegisterOutcome::Rejected => {
                warn!(
                    "Rejected connection {}: nickname {} already in use",
                    conn_id, nickname
                );
                let _ = packet_tx.send(Packet::Notice {
                    text: "Nickname already in use. Disconnecting.".to_string(),
                });
                // Dropping the sender lets the writer flush the notice and
                // close the socket; nothing was registered.
                return;
            }
            RegisterOutcome::Joined => {
                registry.notice(&format!("{} has joined the game!", nickname));
                let _ = packet_tx.send(Packet::Notice {
                    text: "Connected to the server!".to_string(),
                });
            }
            RegisterOutcome::Reconnected => {
                let _ = packet_tx.send(Packet::Notice {
                    text: "Welcome back!".to_string(),
                });
                registry.notice(&format!("{} has reconnected.", nickname));
            }
        }
    }

    if event_tx
        .send(GameEvent::PlayerJoined {
            nickname: nickname.clone(),
        })
        .is_err()
    {
        return;
    }

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let text = line.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                let event = GameEvent::AnswerReceived {
                    nickname: nickname.clone(),
                    text,
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("{} closed the connection", nickname);
                break;
            }
            Err(e) => {
                warn!("Error reading from {}: {}", nickname, e);
                break;
            }
        }
    }

    let departed = {
        let mut registry = registry.write().await;
        let departed = registry.disconnect(conn_id);
        if let Some(nickname) = &departed {
            registry.notice(&format!("{} has left the game.", nickname));
        }
        departed
    };
    if let Some(nickname) = departed {
        let _ = event_tx.send(GameEvent::PlayerLeft { nickname });
    }
}
