//! Per-connection handler
//!
//! One `Connection` runs on its own task and owns the socket for its
//! entire lifetime. It drives the session state machine: prompt for a
//! unique screen name, announce the join, relay messages, and on any
//! exit path clean its name and sink out of the registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::constants::MAX_LINE_LEN;
use crate::protocol::{Message, MessageReader, MessageWriter, ProtocolError};
use crate::registry::RoomRegistry;
use crate::session::SessionState;

/// Handler for one accepted connection
pub struct Connection {
    state: SessionState,
    reader: MessageReader<OwnedReadHalf>,
    writer: MessageWriter<OwnedWriteHalf>,
    registry: Arc<RoomRegistry>,
    idle_timeout: Option<Duration>,
}

impl Connection {
    /// Wrap a freshly accepted socket
    pub fn new(
        session_id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        registry: Arc<RoomRegistry>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        let (read_half, write_half) = socket.into_split();

        Self {
            state: SessionState::new(session_id, peer_addr),
            reader: MessageReader::new(read_half),
            writer: MessageWriter::new(write_half),
            registry,
            idle_timeout,
        }
    }

    /// Drive the connection to completion
    ///
    /// Cleanup runs on every exit path: the name and sink come out of the
    /// registry (both idempotent no-ops if negotiation never finished) and
    /// the disconnect announcement goes out if a name was accepted. A peer
    /// disconnect is a normal outcome, not an error.
    pub async fn run(mut self) -> Result<()> {
        let outcome = self.serve().await;
        self.teardown().await;

        match outcome {
            Err(e) if e.is_disconnect() => Ok(()),
            other => other,
        }
    }

    async fn serve(&mut self) -> Result<()> {
        let name = self.negotiate_name().await?;

        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            name = %name,
            rejected = self.state.rejected_candidates,
            "Name accepted"
        );
        self.writer.write_message(&Message::name_accepted()).await?;

        // Announce to the clients already in the room, then add our own
        // sink. The joiner does not receive its own announcement; that
        // ordering is not load-bearing for correctness.
        self.registry
            .broadcast(Message::broadcast_line(format!("{} has connected", name)))
            .await;

        let (sink, outbound) = mpsc::unbounded_channel();
        self.registry.add_sink(self.state.id, sink).await;
        self.state.start_relaying();

        self.relay(&name, outbound).await
    }

    /// Prompt for screen names until the registry accepts one
    ///
    /// A taken or blank candidate, or a record where a text line was
    /// expected, re-prompts with `SUBMITNAME`. EOF or garbage tears the
    /// connection down with nothing registered.
    async fn negotiate_name(&mut self) -> Result<String> {
        self.writer.write_message(&Message::submit_name()).await?;
        self.state.start_negotiation();

        loop {
            let candidate = match self.read_inbound().await? {
                Message::Text(line) => line,
                Message::Record(_) => {
                    // Only a text line can carry a name candidate
                    self.state.reject_candidate();
                    self.writer.write_message(&Message::submit_name()).await?;
                    continue;
                }
            };

            if self.registry.try_register(&candidate).await {
                self.state.accept_name(candidate.clone());
                return Ok(candidate);
            }

            self.state.reject_candidate();
            tracing::debug!(
                session_id = self.state.id,
                candidate = %candidate,
                "Name rejected, re-prompting"
            );
            self.writer.write_message(&Message::submit_name()).await?;
        }
    }

    /// Fan this client's messages out and deliver broadcasts back to it
    async fn relay(
        &mut self,
        name: &str,
        mut outbound: mpsc::UnboundedReceiver<Message>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                delivery = outbound.recv() => {
                    // The registry holds the only sender; it lives until
                    // teardown removes it, so the channel cannot close here
                    let message = delivery.ok_or(Error::ConnectionClosed)?;
                    self.writer.write_message(&message).await?;
                }
                inbound = read_inbound_from(&mut self.reader, self.idle_timeout) => {
                    match inbound? {
                        Message::Text(line) => {
                            // Relaying prepends the broadcast prefix; an
                            // unbounded line would push the outbound frame
                            // past the decode limit at every recipient
                            if line.len() > MAX_LINE_LEN {
                                return Err(ProtocolError::LineTooLong(line.len()).into());
                            }
                            self.state.texts_relayed += 1;
                            self.registry
                                .broadcast(Message::broadcast_line(format!("{}: {}", name, line)))
                                .await;
                        }
                        record @ Message::Record(_) => {
                            self.state.records_relayed += 1;
                            self.registry.broadcast(record).await;
                        }
                    }
                }
            }
        }
    }

    async fn read_inbound(&mut self) -> Result<Message> {
        read_inbound_from(&mut self.reader, self.idle_timeout).await
    }

    async fn teardown(&mut self) {
        self.state.close();

        self.registry.remove_sink(self.state.id).await;

        if let Some(name) = self.state.name.clone() {
            self.registry.unregister(&name).await;
            self.registry
                .broadcast(Message::broadcast_line(format!("{} has disconnected", name)))
                .await;

            tracing::info!(
                session_id = self.state.id,
                name = %name,
                texts = self.state.texts_relayed,
                records = self.state.records_relayed,
                duration_secs = self.state.duration().as_secs(),
                "Client disconnected"
            );
        } else {
            tracing::debug!(
                session_id = self.state.id,
                peer = %self.state.peer_addr,
                "Connection closed before name acceptance"
            );
        }
    }
}

async fn read_inbound_from(
    reader: &mut MessageReader<OwnedReadHalf>,
    idle_timeout: Option<Duration>,
) -> Result<Message> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, reader.read_message())
            .await
            .map_err(|_| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "idle timeout elapsed",
                ))
            })?,
        None => reader.read_message().await,
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::protocol::constants::{NAMEACCEPTED, SUBMITNAME};

    /// Accept one connection and run a handler for it against `registry`
    fn spawn_handler(
        listener: TcpListener,
        registry: Arc<RoomRegistry>,
        session_id: u64,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let (socket, peer_addr) = listener.accept().await.unwrap();
            let connection = Connection::new(session_id, socket, peer_addr, registry, None);
            let _ = connection.run().await;
        })
    }

    async fn raw_peer(
        addr: SocketAddr,
    ) -> (MessageReader<OwnedReadHalf>, MessageWriter<OwnedWriteHalf>) {
        let socket = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = socket.into_split();
        (MessageReader::new(read_half), MessageWriter::new(write_half))
    }

    #[tokio::test]
    async fn test_negotiation_prompts_and_accepts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());
        spawn_handler(listener, Arc::clone(&registry), 1);

        let (mut reader, mut writer) = raw_peer(addr).await;

        let prompt = reader.read_message().await.unwrap();
        assert_eq!(prompt.as_text(), Some(SUBMITNAME));

        writer.write_message(&Message::text("Alice")).await.unwrap();

        let reply = reader.read_message().await.unwrap();
        assert_eq!(reply.as_text(), Some(NAMEACCEPTED));
        assert!(registry.is_registered("Alice").await);
    }

    #[tokio::test]
    async fn test_taken_name_is_reprompted() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());
        assert!(registry.try_register("Alice").await);
        spawn_handler(listener, Arc::clone(&registry), 2);

        let (mut reader, mut writer) = raw_peer(addr).await;

        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );
        writer.write_message(&Message::text("Alice")).await.unwrap();

        // Taken name: prompted again
        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );
        writer.write_message(&Message::text("Bob")).await.unwrap();

        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(NAMEACCEPTED)
        );
        assert!(registry.is_registered("Bob").await);
    }

    #[tokio::test]
    async fn test_record_during_negotiation_reprompts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());
        spawn_handler(listener, Arc::clone(&registry), 3);

        let (mut reader, mut writer) = raw_peer(addr).await;

        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );
        writer.write_message(&Message::record(1, "nope")).await.unwrap();

        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );
        writer.write_message(&Message::text("Carol")).await.unwrap();

        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(NAMEACCEPTED)
        );
    }

    #[tokio::test]
    async fn test_disconnect_during_negotiation_registers_nothing() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());
        let handle = spawn_handler(listener, Arc::clone(&registry), 4);

        let (mut reader, writer) = raw_peer(addr).await;
        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );

        drop(writer);
        drop(reader);
        handle.await.unwrap();

        assert_eq!(registry.name_count().await, 0);
        assert_eq!(registry.sink_count().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_frame_tears_connection_down() {
        use tokio::io::AsyncWriteExt;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());
        let handle = spawn_handler(listener, Arc::clone(&registry), 5);

        let mut socket = TcpStream::connect(addr).await.unwrap();
        // Garbage length prefix way past the frame limit
        socket.write_all(&[0xFF, 0xFF, 0xFF, 0xFF]).await.unwrap();
        socket.flush().await.unwrap();

        handle.await.unwrap();
        assert_eq!(registry.name_count().await, 0);
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(RoomRegistry::new());

        let handle = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let (socket, peer_addr) = listener.accept().await.unwrap();
                let connection = Connection::new(
                    6,
                    socket,
                    peer_addr,
                    registry,
                    Some(Duration::from_millis(50)),
                );
                connection.run().await
            })
        };

        let (mut reader, mut writer) = raw_peer(addr).await;
        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(SUBMITNAME)
        );
        writer.write_message(&Message::text("Dave")).await.unwrap();
        assert_eq!(
            reader.read_message().await.unwrap().as_text(),
            Some(NAMEACCEPTED)
        );

        // Go silent; the handler should time out and clean up
        let result = handle.await.unwrap();
        assert!(result.is_err());
        assert_eq!(registry.name_count().await, 0);
        assert_eq!(registry.sink_count().await, 0);
    }
}
