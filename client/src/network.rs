//! Client connection handling: one TCP stream to the server, with a select
//! loop multiplexing decoded server packets and lines typed on stdin.

use crate::rendering;
use log::{info, warn};
use shared::Packet;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to server {}", server_addr);

        let (read_half, write_half) = stream.into_split();

        Ok(Client {
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
        })
    }

    /// Runs until the server closes the connection or stdin ends. Every
    /// stdin line goes to the server verbatim; the first one answers the
    /// nickname request.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut input_lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = self.reader.next_line() => {
                    match line? {
                        Some(line) => handle_server_line(&line),
                        None => {
                            println!("Connection closed by the server.");
                            break;
                        }
                    }
                }
                line = input_lines.next_line() => {
                    match line? {
                        Some(line) => {
                            self.writer.write_all(line.as_bytes()).await?;
                            self.writer.write_all(b"\n").await?;
                        }
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }
}

/// Decodes and prints one server line. Undecodable lines are logged and
/// skipped; a broken server message must not kill the console.
fn handle_server_line(line: &str) {
    match shared::decode(line) {
        Ok(Packet::NicknameRequest) => {
            print!("Enter your nickname: ");
            let _ = std::io::stdout().flush();
        }
        Ok(Packet::Notice { text }) => println!("{}", text),
        Ok(Packet::Question { prompt, options }) => {
            print!("{}", rendering::render_question(&prompt, &options));
        }
        Ok(Packet::Ranking { entries }) => {
            print!("{}", rendering::render_ranking(&entries));
        }
        Err(e) => warn!("Could not decode server message: {}", e),
    }
}
