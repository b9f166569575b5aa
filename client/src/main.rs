use clap::Parser;
use client::network::Client;
use log::info;

/// Command line arguments for the trivia client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:65432")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to: {}", args.server);

    let mut client = Client::connect(&args.server).await?;
    client.run().await?;

    Ok(())
}
