//! Single-room chat relay over TCP
//!
//! Clients connect, negotiate a unique screen name, and exchange text
//! lines and structured records that the server fans out to everyone in
//! the room. Everything is in memory; when the last client leaves, the
//! room is empty.
//!
//! # Quick start
//!
//! Running a server:
//!
//! ```no_run
//! use chat_rs::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_rs::Result<()> {
//!     let server = ChatServer::new(ServerConfig::default());
//!     server.run().await
//! }
//! ```
//!
//! Talking to it:
//!
//! ```no_run
//! use chat_rs::{ChatClient, ChatEvent};
//!
//! #[tokio::main]
//! async fn main() -> chat_rs::Result<()> {
//!     let mut client = ChatClient::connect("127.0.0.1:9001", &["Alice"]).await?;
//!     client.send_text("hello room").await?;
//!
//!     while let Ok(event) = client.next_event().await {
//!         match event {
//!             ChatEvent::Message(line) => println!("{}", line),
//!             ChatEvent::Record(record) => println!("received {}", record),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! One task per accepted connection, plus the accept loop. The only
//! shared mutable state is the [`RoomRegistry`]: the set of taken screen
//! names and the broadcast sink of every accepted client, guarded by a
//! single mutex so that name negotiation and broadcast snapshots are
//! linearized against each other. Per-connection failures never cross
//! connections; a peer that disconnects or sends garbage is cleaned out
//! of the registry and announced to the room.

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::{ChatClient, ChatEvent, ChatReceiver, ChatSender};
pub use error::{Error, Result};
pub use protocol::{Message, Record};
pub use registry::RoomRegistry;
pub use server::{ChatServer, ServerConfig};
