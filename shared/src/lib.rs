//! Wire protocol shared between the trivia server and client.
//!
//! Server-to-client traffic is a stream of newline-delimited JSON lines, each
//! encoding one tagged [`Packet`]. The explicit tag lets the client tell a
//! question apart from a plain notice without sniffing the payload shape.
//! Client-to-server traffic stays raw text lines (the nickname during the
//! handshake, answers afterwards), so no client-side packet type exists.

use serde::{Deserialize, Serialize};

/// Default port the server binds and the client connects to.
pub const DEFAULT_PORT: u16 = 65432;

/// Default number of seconds a player gets to answer a question.
pub const DEFAULT_ANSWER_SECS: u64 = 30;

/// Messages sent from the server to a connected client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Asks a freshly accepted connection for its nickname.
    NicknameRequest,
    /// Plain human-readable status line or broadcast.
    Notice { text: String },
    /// One question for the current player. The correct answer is never sent.
    Question { prompt: String, options: Vec<String> },
    /// Final standings, announced once the question pool is exhausted.
    Ranking { entries: Vec<RankingEntry> },
}

/// One row of the final ranking, ordered by descending score.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankingEntry {
    pub nickname: String,
    pub score: u32,
}

/// Encodes a packet as a single newline-terminated JSON line.
pub fn encode(packet: &Packet) -> Result<String, serde_json::Error> {
    Ok(format!("{}\n", serde_json::to_string(packet)?))
}

/// Decodes one line back into a packet. Surrounding whitespace is ignored.
pub fn decode(line: &str) -> Result<Packet, serde_json::Error> {
    serde_json::from_str(line.trim())
}
