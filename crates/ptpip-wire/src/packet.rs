use std::fmt;

use bytes::{Buf, Bytes, BytesMut};

use crate::buffer::WriteBuffer;
use crate::error::{Result, WireError};

/// Packet header: length (4) + type (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Initiator/responder GUID length.
pub const GUID_LEN: usize = 16;

/// Maximum unencoded friendly-name length accepted on send.
pub const MAX_FRIENDLY_NAME_LEN: usize = 19;

/// Default maximum packet body size: 16 MiB.
pub const DEFAULT_MAX_PACKET: usize = 16 * 1024 * 1024;

/// TCP port PTP/IP responders listen on.
pub const PTPIP_PORT: u16 = 15740;

/// The PTP/IP packet type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PacketType {
    InitCommandRequest = 0x01,
    InitCommandAck = 0x02,
    InitEventRequest = 0x03,
    InitEventAck = 0x04,
    InitFail = 0x05,
    OperationRequest = 0x06,
    OperationResponse = 0x07,
    Event = 0x08,
    StartData = 0x09,
    Data = 0x0A,
    Cancel = 0x0B,
    EndData = 0x0C,
    ProbeRequest = 0x0D,
    ProbeResponse = 0x0E,
}

impl PacketType {
    /// Map a raw wire code to a packet type.
    pub fn from_wire(raw: u32) -> Option<Self> {
        Some(match raw {
            0x01 => Self::InitCommandRequest,
            0x02 => Self::InitCommandAck,
            0x03 => Self::InitEventRequest,
            0x04 => Self::InitEventAck,
            0x05 => Self::InitFail,
            0x06 => Self::OperationRequest,
            0x07 => Self::OperationResponse,
            0x08 => Self::Event,
            0x09 => Self::StartData,
            0x0A => Self::Data,
            0x0B => Self::Cancel,
            0x0C => Self::EndData,
            0x0D => Self::ProbeRequest,
            0x0E => Self::ProbeResponse,
            _ => return None,
        })
    }

    /// The u32 this type encodes to on the wire.
    pub fn wire_value(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02x})", self, *self as u32)
    }
}

/// One PTP/IP packet, body fields carried directly.
///
/// Both directions encode and decode: the initiator sends the request-side
/// variants, and tests stand in for a responder with the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    InitCommandRequest {
        guid: [u8; GUID_LEN],
        friendly_name: String,
        protocol_version: u32,
    },
    InitCommandAck {
        connection_number: u32,
        guid: [u8; GUID_LEN],
        friendly_name: String,
        protocol_version: u32,
    },
    InitEventRequest {
        connection_number: u32,
    },
    InitEventAck,
    InitFail {
        reason: u32,
    },
    OperationRequest {
        data_phase: u32,
        operation_code: u16,
        transaction_id: u32,
        params: [u32; 4],
    },
    OperationResponse {
        response_code: u16,
        transaction_id: u32,
        params: [u32; 4],
    },
    Event {
        event_code: u16,
        transaction_id: u32,
        params: [u32; 3],
    },
    StartData {
        transaction_id: u32,
        total_length: u64,
    },
    Data {
        transaction_id: u32,
        payload: Bytes,
    },
    Cancel {
        transaction_id: u32,
    },
    EndData {
        transaction_id: u32,
        payload: Bytes,
    },
    ProbeRequest,
    ProbeResponse,
}

impl Packet {
    /// The wire type of this packet.
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::InitCommandRequest { .. } => PacketType::InitCommandRequest,
            Self::InitCommandAck { .. } => PacketType::InitCommandAck,
            Self::InitEventRequest { .. } => PacketType::InitEventRequest,
            Self::InitEventAck => PacketType::InitEventAck,
            Self::InitFail { .. } => PacketType::InitFail,
            Self::OperationRequest { .. } => PacketType::OperationRequest,
            Self::OperationResponse { .. } => PacketType::OperationResponse,
            Self::Event { .. } => PacketType::Event,
            Self::StartData { .. } => PacketType::StartData,
            Self::Data { .. } => PacketType::Data,
            Self::Cancel { .. } => PacketType::Cancel,
            Self::EndData { .. } => PacketType::EndData,
            Self::ProbeRequest => PacketType::ProbeRequest,
            Self::ProbeResponse => PacketType::ProbeResponse,
        }
    }
}

/// Encode the friendly name as UTF-16LE with an explicit null terminator.
///
/// Each source byte becomes (byte, 0x00); non-ASCII input is truncated to
/// the byte, matching the wire behavior responders expect.
fn encode_friendly_name(name: &str) -> Result<Vec<u8>> {
    if name.len() > MAX_FRIENDLY_NAME_LEN {
        return Err(WireError::NameTooLong {
            len: name.len(),
            max: MAX_FRIENDLY_NAME_LEN,
        });
    }
    let mut out = Vec::with_capacity(name.len() * 2 + 2);
    for b in name.bytes() {
        out.push(b);
        out.push(0x00);
    }
    out.push(0x00);
    out.push(0x00);
    Ok(out)
}

/// Decode a null-terminated UTF-16LE friendly name, low byte per code unit.
fn decode_friendly_name(body: &mut Bytes, packet_type: PacketType) -> Result<String> {
    let mut raw = Vec::new();
    loop {
        need(body, 2, packet_type)?;
        let v = body.get_u16_le();
        if v == 0 {
            break;
        }
        raw.push((v & 0xFF) as u8);
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

fn need(body: &Bytes, n: usize, packet_type: PacketType) -> Result<()> {
    if body.remaining() < n {
        return Err(WireError::Truncated {
            packet_type,
            expected: n,
            got: body.remaining(),
        });
    }
    Ok(())
}

/// Read a trailing u32 parameter, tolerating fields absent on the wire.
fn read_optional_u32(body: &mut Bytes) -> u32 {
    if body.remaining() >= 4 {
        body.get_u32_le()
    } else {
        0
    }
}

fn write_header(dst: &mut WriteBuffer, body_len: usize, packet_type: PacketType) -> Result<()> {
    dst.write_u32((HEADER_SIZE + body_len) as u32)?;
    dst.write_u32(packet_type.wire_value())
}

/// Encode a packet into the staging buffer.
///
/// The length field always equals 8 plus the body bytes written.
pub fn encode_packet(packet: &Packet, dst: &mut WriteBuffer) -> Result<()> {
    let ty = packet.packet_type();
    match packet {
        Packet::InitCommandRequest {
            guid,
            friendly_name,
            protocol_version,
        } => {
            let name = encode_friendly_name(friendly_name)?;
            write_header(dst, GUID_LEN + name.len() + 4, ty)?;
            dst.write_raw(guid)?;
            dst.write_raw(&name)?;
            dst.write_u32(*protocol_version)
        }
        Packet::InitCommandAck {
            connection_number,
            guid,
            friendly_name,
            protocol_version,
        } => {
            let name = encode_friendly_name(friendly_name)?;
            write_header(dst, 4 + GUID_LEN + name.len() + 4, ty)?;
            dst.write_u32(*connection_number)?;
            dst.write_raw(guid)?;
            dst.write_raw(&name)?;
            dst.write_u32(*protocol_version)
        }
        Packet::InitEventRequest { connection_number } => {
            write_header(dst, 4, ty)?;
            dst.write_u32(*connection_number)
        }
        Packet::InitEventAck | Packet::ProbeRequest | Packet::ProbeResponse => {
            write_header(dst, 0, ty)
        }
        Packet::InitFail { reason } => {
            write_header(dst, 4, ty)?;
            dst.write_u32(*reason)
        }
        Packet::OperationRequest {
            data_phase,
            operation_code,
            transaction_id,
            params,
        } => {
            write_header(dst, 26, ty)?;
            dst.write_u32(*data_phase)?;
            dst.write_u16(*operation_code)?;
            dst.write_u32(*transaction_id)?;
            for p in params {
                dst.write_u32(*p)?;
            }
            Ok(())
        }
        Packet::OperationResponse {
            response_code,
            transaction_id,
            params,
        } => {
            write_header(dst, 22, ty)?;
            dst.write_u16(*response_code)?;
            dst.write_u32(*transaction_id)?;
            for p in params {
                dst.write_u32(*p)?;
            }
            Ok(())
        }
        Packet::Event {
            event_code,
            transaction_id,
            params,
        } => {
            write_header(dst, 18, ty)?;
            dst.write_u16(*event_code)?;
            dst.write_u32(*transaction_id)?;
            for p in params {
                dst.write_u32(*p)?;
            }
            Ok(())
        }
        Packet::StartData {
            transaction_id,
            total_length,
        } => {
            write_header(dst, 12, ty)?;
            dst.write_u32(*transaction_id)?;
            dst.write_u64(*total_length)
        }
        Packet::Data {
            transaction_id,
            payload,
        }
        | Packet::EndData {
            transaction_id,
            payload,
        } => {
            write_header(dst, 4 + payload.len(), ty)?;
            dst.write_u32(*transaction_id)?;
            dst.write_raw(payload)
        }
        Packet::Cancel { transaction_id } => {
            write_header(dst, 4, ty)?;
            dst.write_u32(*transaction_id)
        }
    }
}

/// Decode one packet body that arrived with the given type.
fn decode_body(ty: PacketType, mut body: Bytes) -> Result<Packet> {
    let packet = match ty {
        PacketType::InitCommandRequest => {
            need(&body, GUID_LEN, ty)?;
            let mut guid = [0u8; GUID_LEN];
            body.copy_to_slice(&mut guid);
            let friendly_name = decode_friendly_name(&mut body, ty)?;
            need(&body, 4, ty)?;
            Packet::InitCommandRequest {
                guid,
                friendly_name,
                protocol_version: body.get_u32_le(),
            }
        }
        PacketType::InitCommandAck => {
            need(&body, 4 + GUID_LEN, ty)?;
            let connection_number = body.get_u32_le();
            let mut guid = [0u8; GUID_LEN];
            body.copy_to_slice(&mut guid);
            let friendly_name = decode_friendly_name(&mut body, ty)?;
            need(&body, 4, ty)?;
            Packet::InitCommandAck {
                connection_number,
                guid,
                friendly_name,
                protocol_version: body.get_u32_le(),
            }
        }
        PacketType::InitEventRequest => {
            need(&body, 4, ty)?;
            Packet::InitEventRequest {
                connection_number: body.get_u32_le(),
            }
        }
        PacketType::InitEventAck => Packet::InitEventAck,
        PacketType::InitFail => Packet::InitFail {
            reason: read_optional_u32(&mut body),
        },
        PacketType::OperationRequest => {
            need(&body, 10, ty)?;
            let data_phase = body.get_u32_le();
            let operation_code = body.get_u16_le();
            let transaction_id = body.get_u32_le();
            let mut params = [0u32; 4];
            for p in &mut params {
                *p = read_optional_u32(&mut body);
            }
            Packet::OperationRequest {
                data_phase,
                operation_code,
                transaction_id,
                params,
            }
        }
        PacketType::OperationResponse => {
            need(&body, 6, ty)?;
            let response_code = body.get_u16_le();
            let transaction_id = body.get_u32_le();
            let mut params = [0u32; 4];
            for p in &mut params {
                *p = read_optional_u32(&mut body);
            }
            Packet::OperationResponse {
                response_code,
                transaction_id,
                params,
            }
        }
        PacketType::Event => {
            need(&body, 6, ty)?;
            let event_code = body.get_u16_le();
            let transaction_id = body.get_u32_le();
            let mut params = [0u32; 3];
            for p in &mut params {
                *p = read_optional_u32(&mut body);
            }
            Packet::Event {
                event_code,
                transaction_id,
                params,
            }
        }
        PacketType::StartData => {
            need(&body, 12, ty)?;
            Packet::StartData {
                transaction_id: body.get_u32_le(),
                total_length: body.get_u64_le(),
            }
        }
        PacketType::Data => {
            need(&body, 4, ty)?;
            Packet::Data {
                transaction_id: body.get_u32_le(),
                payload: body,
            }
        }
        PacketType::Cancel => {
            need(&body, 4, ty)?;
            Packet::Cancel {
                transaction_id: body.get_u32_le(),
            }
        }
        PacketType::EndData => {
            need(&body, 4, ty)?;
            Packet::EndData {
                transaction_id: body.get_u32_le(),
                payload: body,
            }
        }
        PacketType::ProbeRequest => Packet::ProbeRequest,
        PacketType::ProbeResponse => Packet::ProbeResponse,
    };
    Ok(packet)
}

/// Decode a packet from a buffer of received bytes.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn try_decode(src: &mut BytesMut, max_packet_size: usize) -> Result<Option<Packet>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let declared = u32::from_le_bytes(src[0..4].try_into().unwrap()) as usize;
    if declared < HEADER_SIZE {
        return Err(WireError::InvalidLength(declared as u32));
    }

    let body_len = declared - HEADER_SIZE;
    if body_len > max_packet_size {
        return Err(WireError::PacketTooLarge {
            size: body_len,
            max: max_packet_size,
        });
    }

    if src.len() < declared {
        return Ok(None); // Need more data
    }

    let raw_type = u32::from_le_bytes(src[4..8].try_into().unwrap());
    src.advance(HEADER_SIZE);
    let body = src.split_to(body_len).freeze();

    let ty = PacketType::from_wire(raw_type).ok_or(WireError::UnknownPacketType(raw_type))?;
    decode_body(ty, body).map(Some)
}
