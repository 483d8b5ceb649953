//! Send lines from stdin to a chat server
//!
//! Run with: cargo run --example send_message -- SENDER [SERVER_ADDR]
//!
//! Each non-empty line becomes one message from SENDER.

use chat_broker::error::Error;
use chat_broker::{ChatClient, ClientConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(sender) = args.first().cloned() else {
        eprintln!("Usage: send_message SENDER [SERVER_ADDR]");
        std::process::exit(1);
    };
    let addr = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "127.0.0.1:40040".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_broker=info".parse()?),
        )
        .init();

    let mut client = ChatClient::connect(ClientConfig::new(addr)).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match client.send(&sender, &line).await {
            Ok(ack) => println!("sent #{}", ack.seq),
            Err(Error::Status { code, detail }) => eprintln!("rejected: {:?} ({})", code, detail),
            Err(e) => return Err(e.into()),
        }
    }

    client.close().await?;
    Ok(())
}
