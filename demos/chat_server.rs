//! Chat relay server demo
//!
//! Run with: cargo run --example chat_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example chat_server                  # binds to 0.0.0.0:9001
//!   cargo run --example chat_server 127.0.0.1        # binds to 127.0.0.1:9001
//!   cargo run --example chat_server 127.0.0.1:9002   # binds to 127.0.0.1:9002
//!
//! Connect with any number of chat_client instances. Set RUST_LOG for
//! more detail, e.g. RUST_LOG=chat_rs=debug.

use std::net::SocketAddr;

use chat_rs::{ChatServer, ServerConfig};

fn parse_bind_addr(arg: Option<String>) -> SocketAddr {
    let arg = match arg {
        Some(arg) => arg,
        None => return SocketAddr::from(([0, 0, 0, 0], 9001)),
    };

    // Accept "ip:port" or a bare ip with the default port
    arg.parse()
        .or_else(|_| format!("{}:9001", arg).parse())
        .unwrap_or_else(|_| {
            eprintln!("Invalid bind address: {}", arg);
            std::process::exit(1);
        })
}

#[tokio::main]
async fn main() -> chat_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chat_rs=info")),
        )
        .init();

    let addr = parse_bind_addr(std::env::args().nth(1));
    let server = ChatServer::new(ServerConfig::with_addr(addr));

    println!("Chat server running on {}; Ctrl-C to stop", addr);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
