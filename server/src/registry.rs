//! Player roster management for the trivia server
//!
//! This module handles the server-side roster of registered players:
//! - Registration, rejection of duplicate nicknames, and reconnection
//! - Connection slot lifecycle (a player survives a dropped connection)
//! - Score tracking and final ranking
//! - Broadcast and point-to-point message delivery
//!
//! The registry is the single source of truth for who is playing. It is kept
//! behind one lock, and every message it delivers is a channel push to a
//! per-connection writer task, so no network I/O ever happens under the lock.

use log::info;
use shared::{Packet, RankingEntry};
use tokio::sync::mpsc;

/// Outbound channel to one connection's writer task.
pub type PacketSender = mpsc::UnboundedSender<Packet>;

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First registration under this nickname.
    Joined,
    /// The nickname was known and its connection slot was empty; the slot has
    /// been refilled and the previous score retained.
    Reconnected,
    /// The nickname is bound to a live connection. Nothing was mutated; the
    /// caller must close the new connection.
    Rejected,
}

/// One registered player.
///
/// The nickname is the stable identity key. The connection slot holds the
/// sender for the current connection together with that connection's id, and
/// is emptied on disconnect so the player can come back under the same name.
#[derive(Debug)]
pub struct Player {
    pub nickname: String,
    connection: Option<(u64, PacketSender)>,
    pub score: u32,
}

impl Player {
    fn new(nickname: &str, conn_id: u64, sender: PacketSender) -> Self {
        Self {
            nickname: nickname.to_string(),
            connection: Some((conn_id, sender)),
            score: 0,
        }
    }
}

/// Ordered roster of players. Vector order is registration order, which is
/// also the turn order for the whole session.
#[derive(Debug, Default)]
pub struct Registry {
    players: Vec<Player>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
        }
    }

    /// Registers a connection under a nickname.
    ///
    /// Unknown nicknames are appended with a zero score. A known nickname
    /// whose slot is empty gets the slot refilled (reconnection). A known
    /// nickname with a live connection is rejected without mutating anything.
    pub fn register(&mut self, nickname: &str, conn_id: u64, sender: PacketSender) -> RegisterOutcome {
        if let Some(player) = self.players.iter_mut().find(|p| p.nickname == nickname) {
            if player.connection.is_none() {
                player.connection = Some((conn_id, sender));
                info!("{} has reconnected", nickname);
                RegisterOutcome::Reconnected
            } else {
                RegisterOutcome::Rejected
            }
        } else {
            self.players.push(Player::new(nickname, conn_id, sender));
            info!("New player: {}", nickname);
            RegisterOutcome::Joined
        }
    }

    /// Clears the connection slot belonging to `conn_id` and returns the
    /// affected nickname. The score is retained for reconnection.
    ///
    /// The slot is matched by connection id, not by nickname: a stale handler
    /// finishing after its player already reconnected holds an old id and
    /// must not clear the new connection.
    pub fn disconnect(&mut self, conn_id: u64) -> Option<String> {
        for player in &mut self.players {
            if player.connection.as_ref().map(|(id, _)| *id) == Some(conn_id) {
                player.connection = None;
                info!("{} has disconnected", player.nickname);
                return Some(player.nickname.clone());
            }
        }
        None
    }

    /// Number of registered players, connected or not. The session activation
    /// check counts by registration, not by live connections.
    pub fn count_registered(&self) -> usize {
        self.players.len()
    }

    pub fn is_connected(&self, nickname: &str) -> bool {
        self.players
            .iter()
            .any(|p| p.nickname == nickname && p.connection.is_some())
    }

    pub fn index_of(&self, nickname: &str) -> Option<usize> {
        self.players.iter().position(|p| p.nickname == nickname)
    }

    /// Finds the next seat with a live connection, scanning forward from
    /// `from` with wrap-around. Returns the seat index and its nickname.
    pub fn next_connected(&self, from: usize) -> Option<(usize, String)> {
        if self.players.is_empty() {
            return None;
        }
        let n = self.players.len();
        (0..n)
            .map(|k| (from + k) % n)
            .find(|&i| self.players[i].connection.is_some())
            .map(|i| (i, self.players[i].nickname.clone()))
    }

    /// Sends a packet to the player at `index`. A failed send means the
    /// writer task is gone, so the slot is cleared and `false` returned.
    pub fn send_to(&mut self, index: usize, packet: Packet) -> bool {
        if let Some(player) = self.players.get_mut(index) {
            if let Some((_, sender)) = &player.connection {
                if sender.send(packet).is_ok() {
                    return true;
                }
                player.connection = None;
            }
        }
        false
    }

    /// Delivers a packet to every live connection.
    ///
    /// A failed send disconnects that player and announces the departure to
    /// the remaining players; delivery to the others is never aborted.
    pub fn broadcast(&mut self, packet: Packet) {
        let mut dropped = self.try_broadcast(packet);
        while let Some(nickname) = dropped.pop() {
            info!("{} dropped during broadcast", nickname);
            let departure = Packet::Notice {
                text: format!("{} has left the game.", nickname),
            };
            dropped.extend(self.try_broadcast(departure));
        }
    }

    /// Broadcasts a plain notice line.
    pub fn notice(&mut self, text: &str) {
        self.broadcast(Packet::Notice {
            text: text.to_string(),
        });
    }

    fn try_broadcast(&mut self, packet: Packet) -> Vec<String> {
        let mut dropped = Vec::new();
        for player in &mut self.players {
            if let Some((_, sender)) = &player.connection {
                if sender.send(packet.clone()).is_err() {
                    player.connection = None;
                    dropped.push(player.nickname.clone());
                }
            }
        }
        dropped
    }

    /// Increments a player's score and returns the new value. This is the
    /// only way a score changes, so scores are monotonically increasing.
    pub fn award_point(&mut self, nickname: &str) -> Option<u32> {
        self.players
            .iter_mut()
            .find(|p| p.nickname == nickname)
            .map(|p| {
                p.score += 1;
                p.score
            })
    }

    pub fn score(&self, nickname: &str) -> Option<u32> {
        self.players
            .iter()
            .find(|p| p.nickname == nickname)
            .map(|p| p.score)
    }

    /// Final standings over all registered players, connected or not, sorted
    /// by descending score. The sort is stable, so ties keep registration
    /// order, which makes the ranking deterministic.
    pub fn ranking(&self) -> Vec<RankingEntry> {
        let mut entries: Vec<RankingEntry> = self
            .players
            .iter()
            .map(|p| RankingEntry {
                nickname: p.nickname.clone(),
                score: p.score,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Session reset: removes every player. Dropping the senders closes the
    /// remaining connections, so a new session starts from a clean slate.
    pub fn clear(&mut self) {
        self.players.clear();
    }
}
