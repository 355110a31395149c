//! Chat wire protocol
//!
//! The protocol is a thin framing layer over TCP carrying two message
//! variants. Negotiation and relay both ride on the same two variants;
//! control lines (`SUBMITNAME`, `NAMEACCEPTED`, `MESSAGE <body>`) are
//! ordinary text messages with well-known contents.
//!
//! ```text
//! Client                                   Server
//!   |                                        |
//!   |<------ Text("SUBMITNAME") ------------|
//!   |------- Text(candidate name) --------->|
//!   |            (repeats until unique)      |
//!   |<------ Text("NAMEACCEPTED") ----------|
//!   |                                        |
//!   |------- Text(line) / Record{id,label} ->|
//!   |<------ Text("MESSAGE name: line") -----|  (fan-out to all clients)
//!   |<------ Record{id,label} ---------------|  (relayed verbatim)
//! ```

pub mod codec;
pub mod constants;
pub mod message;

pub use codec::{MessageReader, MessageWriter, ProtocolError};
pub use message::{Message, Record};
