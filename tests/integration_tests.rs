//! Integration tests for the trivia server wire protocol.
//!
//! These tests run a real server on an ephemeral port and drive it through
//! plain TCP connections, exercising the same framing the console client
//! uses: JSON lines from the server, raw text lines to the server.

use server::network::Server;
use server::questions::Question;
use shared::{decode, Packet, RankingEntry};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(3);

fn capital_question() -> Question {
    Question {
        prompt: "What is the capital of France?".to_string(),
        options: vec![
            "London".to_string(),
            "Paris".to_string(),
            "Madrid".to_string(),
            "Rome".to_string(),
        ],
        answer: "paris".to_string(),
    }
}

async fn start_server(questions: Vec<Question>, answer_timeout: Duration) -> SocketAddr {
    let server = Server::new("127.0.0.1:0", questions, answer_timeout)
        .await
        .expect("failed to bind test server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

struct TestPlayer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestPlayer {
    /// Connects and completes the nickname handshake.
    async fn join(addr: SocketAddr, nickname: &str) -> TestPlayer {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, write_half) = stream.into_split();
        let mut player = TestPlayer {
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        };

        match player.next_packet().await {
            Packet::NicknameRequest => {}
            other => panic!("expected nickname request, got {:?}", other),
        }
        player.send_line(nickname).await;
        player
    }

    async fn send_line(&mut self, text: &str) {
        self.writer
            .write_all(format!("{}\n", text).as_bytes())
            .await
            .expect("write failed");
    }

    async fn next_packet(&mut self) -> Packet {
        let line = timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for packet")
            .expect("read error")
            .expect("connection closed");
        decode(&line).expect("malformed packet from server")
    }

    async fn wait_for_notice(&mut self, needle: &str) -> String {
        loop {
            if let Packet::Notice { text } = self.next_packet().await {
                if text.contains(needle) {
                    return text;
                }
            }
        }
    }

    async fn wait_for_question(&mut self) -> (String, Vec<String>) {
        loop {
            if let Packet::Question { prompt, options } = self.next_packet().await {
                return (prompt, options);
            }
        }
    }

    async fn wait_for_ranking(&mut self) -> Vec<RankingEntry> {
        loop {
            if let Packet::Ranking { entries } = self.next_packet().await {
                return entries;
            }
        }
    }

    /// Asserts the server closes the connection (after skipping anything
    /// still buffered).
    async fn expect_closed(&mut self) {
        loop {
            let line = timeout(WAIT, self.lines.next_line())
                .await
                .expect("timed out waiting for close");
            match line {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return,
            }
        }
    }
}

#[tokio::test]
async fn full_two_player_game() {
    let addr = start_server(vec![capital_question()], Duration::from_secs(5)).await;

    let mut alice = TestPlayer::join(addr, "alice").await;
    // Confirm alice's registration before bob connects so turn order is fixed
    alice.wait_for_notice("Connected to the server!").await;

    let mut bob = TestPlayer::join(addr, "bob").await;
    bob.wait_for_notice("The game is starting!").await;

    let (prompt, options) = alice.wait_for_question().await;
    assert_eq!(prompt, "What is the capital of France?");
    assert_eq!(options.len(), 4);

    // Case-varied answer must count as correct
    alice.send_line("Paris").await;
    alice.wait_for_notice("Correct answer!").await;
    alice.wait_for_notice("Current score: 1").await;
    bob.wait_for_notice("alice's score: 1").await;

    // Pool is exhausted, so bob's dispatch attempt ends the session
    let ranking = bob.wait_for_ranking().await;
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].nickname, "alice");
    assert_eq!(ranking[0].score, 1);
    assert_eq!(ranking[1].nickname, "bob");
    assert_eq!(ranking[1].score, 0);

    let ranking = alice.wait_for_ranking().await;
    assert_eq!(ranking[0].nickname, "alice");
}

#[tokio::test]
async fn deadline_advances_turn_without_scoring() {
    let addr = start_server(vec![capital_question()], Duration::from_millis(300)).await;

    let mut alice = TestPlayer::join(addr, "alice").await;
    alice.wait_for_notice("Connected to the server!").await;
    let mut bob = TestPlayer::join(addr, "bob").await;

    alice.wait_for_question().await;
    // No answer: the deadline resolves the turn
    alice.wait_for_notice("Time expired").await;

    let ranking = alice.wait_for_ranking().await;
    assert!(ranking.iter().all(|e| e.score == 0));

    let ranking = bob.wait_for_ranking().await;
    assert!(ranking.iter().all(|e| e.score == 0));
}

#[tokio::test]
async fn duplicate_nickname_is_rejected() {
    let addr = start_server(vec![capital_question()], Duration::from_secs(5)).await;

    let mut dave = TestPlayer::join(addr, "dave").await;
    dave.wait_for_notice("Connected to the server!").await;

    let mut impostor = TestPlayer::join(addr, "dave").await;
    impostor.wait_for_notice("already in use").await;
    impostor.expect_closed().await;

    // The original connection is unaffected: a second player still starts
    // the game and dave gets the first question
    let mut eve = TestPlayer::join(addr, "eve").await;
    eve.wait_for_notice("The game is starting!").await;
    dave.wait_for_question().await;
}

#[tokio::test]
async fn empty_question_pool_ends_session_immediately() {
    let addr = start_server(Vec::new(), Duration::from_secs(5)).await;

    let mut alice = TestPlayer::join(addr, "alice").await;
    alice.wait_for_notice("Connected to the server!").await;
    let mut bob = TestPlayer::join(addr, "bob").await;

    let ranking = alice.wait_for_ranking().await;
    assert_eq!(ranking.len(), 2);
    assert!(ranking.iter().all(|e| e.score == 0));

    let ranking = bob.wait_for_ranking().await;
    assert_eq!(ranking.len(), 2);
}
