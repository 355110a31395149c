//! Terminal chat client demo
//!
//! Run with: cargo run --example chat_client [SERVER_ADDR] [NAME...]
//!
//! Examples:
//!   cargo run --example chat_client                          # 127.0.0.1:9001 as "guest"
//!   cargo run --example chat_client 127.0.0.1:9001 Alice
//!   cargo run --example chat_client 127.0.0.1:9001 Alice Alice2
//!
//! Extra names are fallback candidates if the first is already taken.
//!
//! Input convention: a line starting with `/` is sent as a structured
//! record, `/<id>,<label>`, e.g. `/7,sensor`. Anything else is sent as
//! a chat line.

use chat_rs::client::parse_outgoing;
use chat_rs::{ChatClient, ChatEvent, Message};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> chat_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chat_rs=warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:9001".to_string());
    let names: Vec<String> = args.collect();
    let candidates: Vec<&str> = if names.is_empty() {
        vec!["guest"]
    } else {
        names.iter().map(String::as_str).collect()
    };

    let client = ChatClient::connect(addr.as_str(), &candidates).await?;
    println!("Connected to {} as {}", addr, client.name());

    let (mut sender, mut receiver) = client.split();

    let display = tokio::spawn(async move {
        loop {
            match receiver.next_event().await {
                Ok(ChatEvent::Message(line)) => println!("{}", line),
                Ok(ChatEvent::Record(record)) => println!("received {}", record),
                Err(_) => {
                    println!("Server closed the connection");
                    std::process::exit(0);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            continue;
        }
        match parse_outgoing(&line) {
            Message::Text(text) => sender.send_text(text).await?,
            Message::Record(record) => sender.send_record(record.id, record.label).await?,
        }
    }

    display.abort();
    Ok(())
}
