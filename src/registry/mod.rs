//! Shared room state
//!
//! The registry is the only shared mutable state in the server. It holds
//! the set of taken screen names and the broadcast sinks of every accepted
//! connection, guarded jointly by a single mutex so that name negotiation,
//! sink membership, and the broadcast snapshot are all linearized against
//! each other.
//!
//! ```text
//!                        Arc<RoomRegistry>
//!                   ┌─────────────────────────┐
//!                   │ Mutex<RoomInner {       │
//!                   │   names: HashSet,       │
//!                   │   sinks: HashMap<id,    │
//!                   │     mpsc::Sender>,      │
//!                   │ }>                      │
//!                   └───────────┬─────────────┘
//!                               │
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!   [Connection]           [Connection]           [Connection]
//!   try_register()         broadcast() ──► every sink ──► TCP
//! ```

pub mod store;

pub use store::{RoomRegistry, Sink};
