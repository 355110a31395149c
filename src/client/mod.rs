//! Programmatic chat client
//!
//! A protocol peer for the relay server: connects, answers `SUBMITNAME`
//! prompts from a candidate list, then exposes send/receive halves. The
//! demo terminal client and the end-to-end tests are built on it; any
//! display shell (graphical or otherwise) would sit on top the same way.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::protocol::constants::{MESSAGE_PREFIX, NAMEACCEPTED, SUBMITNAME};
use crate::protocol::{Message, MessageReader, MessageWriter, Record};

/// An event received from the server after name acceptance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A broadcast text line, `MESSAGE ` prefix already stripped
    Message(String),
    /// A relayed record
    Record(Record),
}

/// Sending half of a connected client
#[derive(Debug)]
pub struct ChatSender {
    writer: MessageWriter<OwnedWriteHalf>,
}

impl ChatSender {
    /// Send a chat line
    pub async fn send_text(&mut self, line: impl Into<String>) -> Result<()> {
        self.writer.write_message(&Message::Text(line.into())).await
    }

    /// Send a structured record
    pub async fn send_record(&mut self, id: i32, label: impl Into<String>) -> Result<()> {
        self.writer.write_message(&Message::record(id, label)).await
    }
}

/// Receiving half of a connected client
#[derive(Debug)]
pub struct ChatReceiver {
    reader: MessageReader<OwnedReadHalf>,
}

impl ChatReceiver {
    /// Wait for the next broadcast event
    ///
    /// Text lines without the `MESSAGE ` prefix are control traffic and
    /// are skipped.
    pub async fn next_event(&mut self) -> Result<ChatEvent> {
        loop {
            match self.reader.read_message().await? {
                Message::Text(line) => {
                    if let Some(body) = line.strip_prefix(MESSAGE_PREFIX) {
                        return Ok(ChatEvent::Message(body.to_string()));
                    }
                }
                Message::Record(record) => return Ok(ChatEvent::Record(record)),
            }
        }
    }
}

/// A connected, named chat client
#[derive(Debug)]
pub struct ChatClient {
    sender: ChatSender,
    receiver: ChatReceiver,
    name: String,
}

impl ChatClient {
    /// Connect to a server and negotiate a screen name
    ///
    /// Candidates from `names` are submitted in order, one per
    /// `SUBMITNAME` prompt; the call resolves once the server accepts one.
    /// Running out of candidates is an error (an interactive client would
    /// keep prompting its user instead).
    pub async fn connect<A: ToSocketAddrs>(addr: A, names: &[&str]) -> Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        let (read_half, write_half) = socket.into_split();

        let mut receiver = ChatReceiver {
            reader: MessageReader::new(read_half),
        };
        let mut sender = ChatSender {
            writer: MessageWriter::new(write_half),
        };

        let mut candidates = names.iter();
        let mut submitted: Option<String> = None;

        let name = loop {
            match receiver.reader.read_message().await? {
                Message::Text(line) if line == SUBMITNAME => {
                    let candidate = candidates
                        .next()
                        .ok_or(Error::Negotiation("every candidate name was rejected"))?;
                    sender.writer.write_message(&Message::text(*candidate)).await?;
                    submitted = Some(candidate.to_string());
                }
                Message::Text(line) if line == NAMEACCEPTED => {
                    break submitted
                        .ok_or(Error::Negotiation("NAMEACCEPTED before a name was submitted"))?;
                }
                // Nothing else is addressed to us before acceptance
                _ => {}
            }
        };

        tracing::debug!(name = %name, "Name negotiation complete");

        Ok(Self {
            sender,
            receiver,
            name,
        })
    }

    /// The accepted screen name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a chat line
    pub async fn send_text(&mut self, line: impl Into<String>) -> Result<()> {
        self.sender.send_text(line).await
    }

    /// Send a structured record
    pub async fn send_record(&mut self, id: i32, label: impl Into<String>) -> Result<()> {
        self.sender.send_record(id, label).await
    }

    /// Wait for the next broadcast event
    pub async fn next_event(&mut self) -> Result<ChatEvent> {
        self.receiver.next_event().await
    }

    /// Split into independent send and receive halves
    ///
    /// Needed when one task reads events while another forwards user
    /// input, as the terminal demo does.
    pub fn split(self) -> (ChatSender, ChatReceiver) {
        (self.sender, self.receiver)
    }
}

/// Parse one line of user input using the sentinel convention
///
/// A line starting with `/` is read as `/<id>,<label>` and becomes a
/// record; everything else is a plain chat line. Input that starts with
/// the sentinel but does not parse as a record falls back to text rather
/// than being dropped.
pub fn parse_outgoing(input: &str) -> Message {
    if let Some(rest) = input.strip_prefix('/') {
        if let Some((id, label)) = rest.split_once(',') {
            if let Ok(id) = id.trim().parse::<i32>() {
                return Message::record(id, label.to_string());
            }
        }
    }

    Message::text(input)
}
