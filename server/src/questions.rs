//! Question pool provider.
//!
//! The pool is an ordered JSON array of question records loaded once at
//! process start. Provider failures are never fatal: a missing or malformed
//! file yields an empty pool, and a session started on an empty pool simply
//! ends immediately with an all-zero ranking.

use log::{error, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One trivia question. Immutable once loaded; each record is delivered to
/// at most one player per session.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Question {
    /// Compares a player's reply to the stored answer, ignoring surrounding
    /// whitespace and letter case.
    pub fn is_correct(&self, reply: &str) -> bool {
        reply.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

/// Loads the question pool from a JSON file.
///
/// Returns an empty pool on any read or parse failure so the server keeps
/// running with whatever it has.
pub fn load_questions(path: &Path) -> Vec<Question> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            error!("Question file not found or unreadable {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Question>>(&data) {
        Ok(questions) => {
            info!("Loaded {} questions from {}", questions.len(), path.display());
            questions
        }
        Err(e) => {
            error!("Failed to parse question file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

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

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_answer_matching_is_case_insensitive() {
        let question = capital_question();

        assert!(question.is_correct("paris"));
        assert!(question.is_correct("Paris"));
        assert!(question.is_correct("PARIS"));
        assert!(question.is_correct("  paris \n"));
    }

    #[test]
    fn test_answer_matching_rejects_wrong_answer() {
        let question = capital_question();

        assert!(!question.is_correct("london"));
        assert!(!question.is_correct(""));
        assert!(!question.is_correct("par is"));
    }

    #[test]
    fn test_load_missing_file_yields_empty_pool() {
        let path = std::env::temp_dir().join("no_such_question_file.json");

        assert!(load_questions(&path).is_empty());
    }

    #[test]
    fn test_load_malformed_file_yields_empty_pool() {
        let path = temp_file("trivia_malformed_questions.json", "{ not valid json");

        assert!(load_questions(&path).is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_valid_file() {
        let contents = r#"[
            {
                "prompt": "What is the capital of France?",
                "options": ["London", "Paris", "Madrid", "Rome"],
                "answer": "paris"
            },
            {
                "prompt": "How many continents are there?",
                "options": ["5", "6", "7", "8"],
                "answer": "7"
            }
        ]"#;
        let path = temp_file("trivia_valid_questions.json", contents);

        let questions = load_questions(&path);

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0], capital_question());
        assert_eq!(questions[1].answer, "7");

        let _ = fs::remove_file(path);
    }
}
