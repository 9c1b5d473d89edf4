use ptpip_wire::{Packet, PacketType, WireError};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Wire-level error (transport I/O or packet codec).
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// A protocol step received a packet of the wrong type.
    #[error("unexpected packet: got {got}, expected {expected}")]
    UnexpectedPacket {
        expected: PacketType,
        got: PacketType,
    },

    /// The responder rejected the init handshake.
    #[error("responder rejected init (reason 0x{reason:08x})")]
    InitFailed { reason: u32 },

    /// The operation response carried a non-OK response code.
    #[error("operation refused by device (response code 0x{code:04x})")]
    DeviceRefused { code: u16 },

    /// The assembled data phase does not match the declared total length.
    #[error("data phase length mismatch: received 0x{received:x}, declared 0x{declared:x}")]
    DataLengthMismatch { received: u64, declared: u64 },

    /// A data-out operation was invoked without payload.
    #[error("data-out phase invoked with empty payload")]
    EmptyDataOut,
}

impl SessionError {
    /// Build an UnexpectedPacket error from the packet that arrived.
    pub(crate) fn unexpected(expected: PacketType, got: &Packet) -> Self {
        Self::UnexpectedPacket {
            expected,
            got: got.packet_type(),
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::Wire(WireError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
