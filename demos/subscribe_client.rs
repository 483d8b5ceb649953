//! Subscribe to a chat server and print every message
//!
//! Run with: cargo run --example subscribe_client [SERVER_ADDR]
//!
//! Prints `[sender] body` per message until the stream ends or Ctrl+C.

use chat_broker::error::Error;
use chat_broker::{ChatClient, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:40040".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_broker=info".parse()?),
        )
        .init();

    let mut client = ChatClient::connect(ClientConfig::new(addr)).await?;
    let mut subscription = client.subscribe().await?;
    client.close().await?;

    println!("Subscribed (session {})", subscription.session_id());

    loop {
        tokio::select! {
            item = subscription.next() => match item {
                Some(Ok(message)) => println!("[{}] {}", message.sender(), message.body()),
                Some(Err(Error::Status { code, detail })) => {
                    eprintln!("Stream ended: {:?} ({})", code, detail);
                    break;
                }
                Some(Err(e)) => {
                    eprintln!("Stream error: {}", e);
                    break;
                }
                None => {
                    println!("Stream closed by server");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                subscription.close().await?;
                break;
            }
        }
    }

    Ok(())
}
