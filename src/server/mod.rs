//! Chat relay server
//!
//! The server side of the protocol: accept loop, per-connection handlers,
//! and configuration. All handlers share one
//! [`RoomRegistry`](crate::registry::RoomRegistry) injected at
//! construction.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::ChatServer;
