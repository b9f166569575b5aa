//! Turn coordinator and session lifecycle.
//!
//! A single coordinator task drives every session: it waits for the
//! activation threshold, then dispatches one question per turn, races the
//! player's reply against the answer deadline, scores, and advances. Because
//! the coordinator is the only consumer of the event channel and the only
//! writer of the turn index, exactly one resolution path runs per turn; a
//! reply and a timeout can never both act on the same question.

use crate::network::GameEvent;
use crate::questions::Question;
use crate::registry::Registry;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use shared::Packet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Registered players required before a session starts.
pub const ACTIVATION_THRESHOLD: usize = 2;

/// How the wait for the current player's answer ended.
enum TurnResolution {
    Answered { text: String },
    DeadlineElapsed,
    PlayerGone,
    ServerShutdown,
}

/// Owns the turn index, the pending question sequence and the answer
/// deadline. Fed by connection handlers through the event channel.
pub struct GameCoordinator {
    registry: Arc<RwLock<Registry>>,
    pool: Vec<Question>,
    answer_timeout: Duration,
    events: mpsc::UnboundedReceiver<GameEvent>,
}

impl GameCoordinator {
    pub fn new(
        registry: Arc<RwLock<Registry>>,
        pool: Vec<Question>,
        answer_timeout: Duration,
        events: mpsc::UnboundedReceiver<GameEvent>,
    ) -> Self {
        Self {
            registry,
            pool,
            answer_timeout,
            events,
        }
    }

    /// Runs sessions back to back until every event sender is gone.
    pub async fn run(mut self) {
        loop {
            if !self.wait_for_players().await {
                return;
            }
            self.run_session().await;
        }
    }

    /// Blocks until the activation threshold is reached. Start is idempotent:
    /// the check runs only here, so joins and reconnects during an active
    /// session cannot retrigger it. Returns false when the channel closes.
    async fn wait_for_players(&mut self) -> bool {
        loop {
            {
                let registry = self.registry.read().await;
                if registry.count_registered() >= ACTIVATION_THRESHOLD {
                    return true;
                }
            }
            match self.events.recv().await {
                Some(GameEvent::PlayerJoined { nickname }) => {
                    debug!("{} registered while waiting for players", nickname);
                }
                Some(_) => {}
                None => return false,
            }
        }
    }

    /// One full session: shuffle a fresh copy of the pool, run turns until
    /// the questions run out (or nobody is left connected), announce the
    /// ranking and reset.
    async fn run_session(&mut self) {
        let mut pending = self.pool.clone();
        pending.shuffle(&mut rand::thread_rng());
        info!("The game is starting with {} questions", pending.len());

        {
            let mut registry = self.registry.write().await;
            registry.notice("The game is starting!");
        }

        let mut current = 0usize;

        loop {
            if pending.is_empty() {
                info!("Question pool exhausted");
                break;
            }

            let seat = {
                let registry = self.registry.read().await;
                registry.next_connected(current)
            };
            let (index, nickname) = match seat {
                Some(seat) => seat,
                None => {
                    warn!("No connected players left, ending session");
                    break;
                }
            };

            self.discard_stale_input();

            let question = pending.remove(0);
            let dispatched = {
                let mut registry = self.registry.write().await;
                let sent = registry.send_to(
                    index,
                    Packet::Question {
                        prompt: question.prompt.clone(),
                        options: question.options.clone(),
                    },
                );
                if !sent {
                    registry.notice(&format!("{} has left the game.", nickname));
                }
                sent
            };
            if !dispatched {
                // The slot died between selection and dispatch; pick again
                // from the same seat without advancing the turn.
                continue;
            }

            info!("Asking {} a question", nickname);

            match self.await_answer(&nickname).await {
                TurnResolution::Answered { text } => {
                    self.score_answer(&nickname, &text, &question).await;
                }
                TurnResolution::DeadlineElapsed => {
                    info!("Time expired for {}", nickname);
                    let mut registry = self.registry.write().await;
                    if let Some(i) = registry.index_of(&nickname) {
                        registry.send_to(
                            i,
                            Packet::Notice {
                                text: "Time expired. Next player.".to_string(),
                            },
                        );
                    }
                }
                TurnResolution::PlayerGone => {
                    info!("{} disconnected during their turn", nickname);
                }
                TurnResolution::ServerShutdown => return,
            }

            // Advance by one seat; the roster length is read at advance time
            // so players who joined mid-session get turns on the next cycle.
            let registry = self.registry.read().await;
            let len = registry.count_registered();
            if len == 0 {
                break;
            }
            current = (index + 1) % len;
        }

        self.end_session().await;
    }

    /// Waits for the current player's reply, racing it against the answer
    /// deadline. The two triggers are arms of one `select!`, so whichever
    /// fires first wins and the loser is dropped with the select.
    async fn await_answer(&mut self, nickname: &str) -> TurnResolution {
        let deadline = tokio::time::sleep(self.answer_timeout);
        tokio::pin!(deadline);

        loop {
            let event = tokio::select! {
                _ = &mut deadline => return TurnResolution::DeadlineElapsed,
                event = self.events.recv() => event,
            };

            match event {
                Some(GameEvent::AnswerReceived { nickname: from, text }) if from == nickname => {
                    return TurnResolution::Answered { text };
                }
                Some(GameEvent::AnswerReceived { nickname: from, .. }) => {
                    debug!("Ignoring out-of-turn input from {}", from);
                }
                Some(GameEvent::PlayerLeft { nickname: gone }) if gone == nickname => {
                    // The handler already cleared the slot and broadcast the
                    // departure. If the player raced a reconnect in between,
                    // the slot is live again and the turn keeps running.
                    let registry = self.registry.read().await;
                    if !registry.is_connected(nickname) {
                        return TurnResolution::PlayerGone;
                    }
                }
                Some(GameEvent::PlayerLeft { .. }) | Some(GameEvent::PlayerJoined { .. }) => {}
                None => return TurnResolution::ServerShutdown,
            }
        }
    }

    /// Scores a reply: personal verdict and running score to the player, and
    /// the updated score broadcast to everyone.
    async fn score_answer(&self, nickname: &str, text: &str, question: &Question) {
        let mut registry = self.registry.write().await;

        let correct = question.is_correct(text);
        let score = if correct {
            info!("{} answered correctly", nickname);
            registry.award_point(nickname)
        } else {
            registry.score(nickname)
        }
        .unwrap_or(0);

        if let Some(i) = registry.index_of(nickname) {
            let verdict = if correct {
                "Correct answer!".to_string()
            } else {
                format!(
                    "Incorrect answer. The correct answer was: {}",
                    question.answer
                )
            };
            registry.send_to(i, Packet::Notice { text: verdict });
            registry.send_to(
                i,
                Packet::Notice {
                    text: format!("Current score: {}", score),
                },
            );
        }

        registry.notice(&format!("{}'s score: {}", nickname, score));
    }

    /// Input queued between turns can only be stale: the next question has
    /// not been sent yet, so nothing legitimate can be waiting. Dropping it
    /// keeps a reply that raced a timeout from scoring a later question.
    fn discard_stale_input(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if let GameEvent::AnswerReceived { nickname, .. } = event {
                debug!("Discarding stale input from {}", nickname);
            }
        }
    }

    /// Session end: announce the ranking and reset. Clearing the registry
    /// drops the per-connection senders, which closes the sockets.
    async fn end_session(&mut self) {
        let mut registry = self.registry.write().await;
        let entries = registry.ranking();
        info!("Session over, final ranking: {:?}", entries);
        registry.broadcast(Packet::Ranking { entries });
        registry.clear();
    }
}
