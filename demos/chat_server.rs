//! Chat broker server
//!
//! Run with: cargo run --example chat_server [BIND_ADDR] [--presence]
//!
//! Examples:
//!   cargo run --example chat_server                       # binds to 127.0.0.1:40040
//!   cargo run --example chat_server 0.0.0.0:40040         # all interfaces
//!   cargo run --example chat_server -- --presence         # announce joins and leaves
//!
//! Then in other terminals:
//!   cargo run --example subscribe_client
//!   cargo run --example send_message -- alice

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chat_broker::{Broker, BrokerConfig, ChatServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: chat_server [BIND_ADDR] [--presence]");
    eprintln!();
    eprintln!("  BIND_ADDR    address to listen on (default 127.0.0.1:40040)");
    eprintln!("  --presence   publish join/leave notices from \"system\"");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let presence = args.iter().any(|a| a == "--presence");
    let mut config = ServerConfig::default();
    if let Some(addr) = args.iter().find(|a| !a.starts_with("--")) {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: invalid address {:?}: {}", addr, e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_broker=debug".parse()?)
                .add_directive("chat_server=debug".parse()?),
        )
        .init();

    let broker = Arc::new(Broker::with_config(
        BrokerConfig::default().announce_presence(presence),
    ));
    let server = ChatServer::new(config.shutdown_timeout(Duration::from_secs(2)), broker.clone());

    println!("Starting chat server on {}", server.bind_addr());

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nShutting down...");
    };

    if let Err(e) = server.run_until(shutdown).await {
        eprintln!("Server error: {}", e);
    }

    let stats = broker.stats();
    println!(
        "Published {} messages ({} rejected), {} subscriptions, {} evicted",
        stats.messages_published,
        stats.messages_rejected,
        stats.total_subscriptions,
        stats.slow_consumer_evictions,
    );

    Ok(())
}
