use crate::packet::PacketType;

/// Errors that can occur on the PTP/IP wire layer.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// An I/O error occurred while reading or writing packets.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,

    /// The packet header carries a type code outside the PTP/IP enumeration.
    #[error("unknown packet type 0x{0:08x}")]
    UnknownPacketType(u32),

    /// The declared packet length is smaller than the 8-byte header.
    #[error("invalid packet length {0} (minimum 8)")]
    InvalidLength(u32),

    /// The declared body exceeds the configured maximum packet size.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// The packet body ended before all declared fields were read.
    #[error("truncated {packet_type} body: need {expected} more bytes, have {got}")]
    Truncated {
        packet_type: PacketType,
        expected: usize,
        got: usize,
    },

    /// The initiator friendly name exceeds the protocol-conservative bound.
    #[error("friendly name too long ({len} bytes, max {max})")]
    NameTooLong { len: usize, max: usize },

    /// The buffer could not grow to the requested capacity.
    #[error("buffer allocation of {requested} bytes refused")]
    AllocationTooLarge { requested: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;
