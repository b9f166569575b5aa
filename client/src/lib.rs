//! # Trivia Game Client Library
//!
//! Console client for the multiplayer trivia game. The client keeps one
//! persistent TCP connection to the server, prints every decoded server
//! packet, and forwards each line typed on stdin to the server — the first
//! line answers the nickname request, later lines answer questions.
//!
//! ## Module Organization
//!
//! - [`network`] — connection handling and the stdin/socket select loop
//! - [`rendering`] — text formatting for questions and the final ranking

pub mod network;
pub mod rendering;
