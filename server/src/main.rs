use clap::Parser;
use log::info;
use server::network::Server;
use server::questions;
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for the trivia server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Seconds a player gets to answer a question
    #[arg(short = 't', long, default_value_t = shared::DEFAULT_ANSWER_SECS)]
    answer_timeout: u64,

    /// Path to the question pool JSON file
    #[arg(short, long, default_value = "questions.json")]
    questions: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let pool = questions::load_questions(&args.questions);
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::new(&address, pool, Duration::from_secs(args.answer_timeout)).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
