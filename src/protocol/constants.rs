//! Protocol constants

/// Default port the chat server listens on
pub const DEFAULT_PORT: u16 = 9001;

/// Default cap on concurrent connections (0 = unlimited)
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Control line asking the client for a screen name
pub const SUBMITNAME: &str = "SUBMITNAME";

/// Control line acknowledging a unique screen name
pub const NAMEACCEPTED: &str = "NAMEACCEPTED";

/// Prefix on every broadcast text line; clients display everything after it
pub const MESSAGE_PREFIX: &str = "MESSAGE ";

/// Frame tag byte for a text message
pub const TAG_TEXT: u8 = 0x00;

/// Frame tag byte for a structured record
pub const TAG_RECORD: u8 = 0x01;

/// Length of the frame header (payload length, big-endian)
pub const FRAME_HEADER_LEN: usize = 4;

/// Maximum accepted frame payload size
///
/// Anything larger is a protocol violation; chat lines and records are
/// tiny, so this bound exists purely to reject garbage length prefixes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Maximum accepted screen name length in bytes
///
/// Longer candidates are rejected like taken ones (re-prompt, not an
/// error). Bounding the name bounds the broadcast prefix.
pub const MAX_NAME_LEN: usize = 64;

/// Maximum chat line length in bytes a client may send
///
/// Relaying prepends `MESSAGE <name>: `, so inbound lines leave headroom
/// below [`MAX_FRAME_SIZE`]; the reserved 128 bytes cover the prefix at
/// [`MAX_NAME_LEN`]. A longer line is a protocol violation for its sender
/// only — the relayed frame always stays decodable for every recipient.
pub const MAX_LINE_LEN: usize = MAX_FRAME_SIZE - 128;
