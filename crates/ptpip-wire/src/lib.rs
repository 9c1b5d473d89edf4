//! PTP/IP packet framing and the little-endian wire codec.
//!
//! This is the lowest layer of the ptpip client. Every PTP/IP packet is
//! framed with:
//! - A 4-byte little-endian total length (header included)
//! - A 4-byte little-endian packet type
//!
//! The fourteen packet kinds the initiator role speaks are modeled as one
//! [`Packet`] sum type; raw type codes never cross this boundary.

pub mod buffer;
pub mod error;
pub mod packet;
pub mod reader;
pub mod writer;

pub use buffer::WriteBuffer;
pub use error::{Result, WireError};
pub use packet::{
    encode_packet, try_decode, Packet, PacketType, DEFAULT_MAX_PACKET, GUID_LEN, HEADER_SIZE,
    MAX_FRIENDLY_NAME_LEN, PTPIP_PORT,
};
pub use reader::PacketReader;
pub use writer::PacketWriter;
