//! # Trivia Game Server Library
//!
//! Authoritative server for the multiplayer turn-based trivia game. The
//! server accepts persistent TCP connections, registers players by nickname,
//! starts a session once two players are registered, asks each connected
//! player one question per turn under an answer deadline, tallies scores, and
//! announces a final ranking when the question pool runs out.
//!
//! ## Architecture
//!
//! One task per accepted connection handles the nickname handshake and
//! forwards every received line to the coordinator; one writer task per
//! connection drains a packet channel onto the socket. A single coordinator
//! task owns the turn index and the pending questions, which makes turn
//! advancement strictly sequential: at most one player is ever awaiting an
//! answer, and the reply-versus-deadline race is resolved inside one
//! `select!`.
//!
//! The shared roster lives behind one lock in [`registry`]. All message
//! delivery under that lock is a channel push, never a socket write, so no
//! connection can stall another.
//!
//! ## Module Organization
//!
//! - [`registry`] — player roster: registration, reconnection, scores,
//!   broadcast and point-to-point delivery
//! - [`game`] — turn coordinator and session lifecycle
//! - [`network`] — TCP listener, connection handlers, internal events
//! - [`questions`] — question pool loading and answer matching
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::questions;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = questions::load_questions(Path::new("questions.json"));
//!     let server = Server::new("127.0.0.1:65432", pool, Duration::from_secs(30)).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
pub mod questions;
pub mod registry;
