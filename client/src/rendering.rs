//! Text formatting for server messages shown on the console.

use shared::RankingEntry;

/// Renders a question with its numbered options.
pub fn render_question(prompt: &str, options: &[String]) -> String {
    let mut out = format!("\n{}\n", prompt);
    for (i, option) in options.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, option));
    }
    out
}

/// Renders the final standings announced at session end.
pub fn render_ranking(entries: &[RankingEntry]) -> String {
    let mut out = String::from("\nGame over!\nFinal ranking:\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {} points\n",
            i + 1,
            entry.nickname,
            entry.score
        ));
    }
    out
}
