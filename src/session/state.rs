//! Session state machine
//!
//! Tracks one connection's lifecycle from accept to teardown.

use std::net::SocketAddr;
use std::time::Instant;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP connected, `SUBMITNAME` not yet sent
    Connecting,
    /// Waiting for a unique screen name from the client
    NegotiatingName,
    /// Name registered, `NAMEACCEPTED` sent, sink not yet live
    Accepted,
    /// Messages from this client are being fanned out
    Relaying,
    /// Connection torn down, registry cleaned up
    Closed,
}

/// Complete per-connection state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Accepted screen name (None until negotiation completes)
    pub name: Option<String>,

    /// Candidate names rejected during negotiation
    pub rejected_candidates: u32,

    /// Text lines relayed from this client
    pub texts_relayed: u64,

    /// Records relayed from this client
    pub records_relayed: u64,
}

impl SessionState {
    /// Create state for a freshly accepted connection
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connecting,
            connected_at: Instant::now(),
            name: None,
            rejected_candidates: 0,
            texts_relayed: 0,
            records_relayed: 0,
        }
    }

    /// Begin name negotiation (the `SUBMITNAME` prompt went out)
    pub fn start_negotiation(&mut self) {
        if self.phase == SessionPhase::Connecting {
            self.phase = SessionPhase::NegotiatingName;
        }
    }

    /// Record a rejected candidate; stays in negotiation
    pub fn reject_candidate(&mut self) {
        self.rejected_candidates += 1;
    }

    /// A unique name was registered for this session
    pub fn accept_name(&mut self, name: String) {
        if self.phase == SessionPhase::NegotiatingName {
            self.name = Some(name);
            self.phase = SessionPhase::Accepted;
        }
    }

    /// Sink is live; messages now fan out
    pub fn start_relaying(&mut self) {
        if self.phase == SessionPhase::Accepted {
            self.phase = SessionPhase::Relaying;
        }
    }

    /// Tear down; terminal from any phase
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Whether a screen name was ever accepted
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Whether this session is in the relay loop
    pub fn is_relaying(&self) -> bool {
        self.phase == SessionPhase::Relaying
    }

    /// Session duration so far
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9001)
    }

    #[test]
    fn test_session_lifecycle() {
        let mut state = SessionState::new(1, addr());

        assert_eq!(state.phase, SessionPhase::Connecting);

        state.start_negotiation();
        assert_eq!(state.phase, SessionPhase::NegotiatingName);

        state.reject_candidate();
        assert_eq!(state.phase, SessionPhase::NegotiatingName);
        assert_eq!(state.rejected_candidates, 1);

        state.accept_name("Alice".into());
        assert_eq!(state.phase, SessionPhase::Accepted);
        assert_eq!(state.name.as_deref(), Some("Alice"));

        state.start_relaying();
        assert!(state.is_relaying());

        state.close();
        assert_eq!(state.phase, SessionPhase::Closed);
    }

    #[test]
    fn test_close_before_acceptance_leaves_no_name() {
        let mut state = SessionState::new(2, addr());

        state.start_negotiation();
        state.close();

        assert_eq!(state.phase, SessionPhase::Closed);
        assert!(!state.has_name());
    }

    #[test]
    fn test_accept_name_requires_negotiation_phase() {
        let mut state = SessionState::new(3, addr());

        // Still in Connecting; the transition must not fire
        state.accept_name("Alice".into());

        assert_eq!(state.phase, SessionPhase::Connecting);
        assert!(!state.has_name());
    }
}
