use std::io::{Read, Write};

use ptpip_wire::{Packet, PacketReader, PacketType, PacketWriter, GUID_LEN};
use tracing::debug;

use crate::error::{Result, SessionError};

/// The identity this client presents in the InitCommandRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiator {
    /// 16-byte GUID identifying the initiator.
    pub guid: [u8; GUID_LEN],
    /// Friendly name, at most 19 bytes before UTF-16LE encoding.
    pub friendly_name: String,
    /// PTP/IP protocol version.
    pub protocol_version: u32,
}

impl Default for Initiator {
    fn default() -> Self {
        Self {
            guid: std::array::from_fn(|i| i as u8),
            friendly_name: "hogehoge".to_string(),
            protocol_version: 0x0001_0000,
        }
    }
}

/// What the responder reported about itself in the InitCommandAck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderIdentity {
    /// Connection number binding the event channel to this session.
    pub connection_number: u32,
    /// Responder GUID.
    pub guid: [u8; GUID_LEN],
    /// Responder friendly name.
    pub friendly_name: String,
    /// Responder protocol version.
    pub protocol_version: u32,
}

/// Run the command-channel half of the init handshake.
///
/// Sends InitCommandRequest and expects InitCommandAck; the returned
/// connection number is required verbatim on the event channel.
pub fn init_command<R: Read, W: Write>(
    reader: &mut PacketReader<R>,
    writer: &mut PacketWriter<W>,
    initiator: &Initiator,
) -> Result<ResponderIdentity> {
    writer.send(&Packet::InitCommandRequest {
        guid: initiator.guid,
        friendly_name: initiator.friendly_name.clone(),
        protocol_version: initiator.protocol_version,
    })?;

    match reader.read_packet()? {
        Packet::InitCommandAck {
            connection_number,
            guid,
            friendly_name,
            protocol_version,
        } => {
            debug!(
                connection_number = format_args!("0x{connection_number:08x}"),
                responder = %friendly_name,
                "init command acknowledged"
            );
            Ok(ResponderIdentity {
                connection_number,
                guid,
                friendly_name,
                protocol_version,
            })
        }
        Packet::InitFail { reason } => Err(SessionError::InitFailed { reason }),
        other => Err(SessionError::unexpected(PacketType::InitCommandAck, &other)),
    }
}

/// Run the event-channel half of the init handshake.
pub fn init_event<R: Read, W: Write>(
    reader: &mut PacketReader<R>,
    writer: &mut PacketWriter<W>,
    connection_number: u32,
) -> Result<()> {
    writer.send(&Packet::InitEventRequest { connection_number })?;

    match reader.read_packet()? {
        Packet::InitEventAck => {
            debug!("init event acknowledged");
            Ok(())
        }
        Packet::InitFail { reason } => Err(SessionError::InitFailed { reason }),
        other => Err(SessionError::unexpected(PacketType::InitEventAck, &other)),
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::thread;

    use super::*;

    fn split(stream: UnixStream) -> (PacketReader<UnixStream>, PacketWriter<UnixStream>) {
        let reader = PacketReader::new(stream.try_clone().unwrap());
        (reader, PacketWriter::new(stream))
    }

    #[test]
    fn command_handshake_captures_connection_number() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let request = reader.read_packet().unwrap();
            let Packet::InitCommandRequest {
                guid,
                friendly_name,
                protocol_version,
            } = request
            else {
                panic!("expected InitCommandRequest, got {request:?}");
            };
            assert_eq!(friendly_name, "hogehoge");
            assert_eq!(protocol_version, 0x0001_0000);

            writer
                .send(&Packet::InitCommandAck {
                    connection_number: 0xDEAD_BEEF,
                    guid,
                    friendly_name: "camera".to_string(),
                    protocol_version,
                })
                .unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let identity = init_command(&mut reader, &mut writer, &Initiator::default()).unwrap();
        responder.join().unwrap();

        assert_eq!(identity.connection_number, 0xDEAD_BEEF);
        assert_eq!(identity.friendly_name, "camera");
    }

    #[test]
    fn event_handshake_echoes_connection_number() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let request = reader.read_packet().unwrap();
            assert_eq!(
                request,
                Packet::InitEventRequest {
                    connection_number: 0xDEAD_BEEF
                }
            );
            writer.send(&Packet::InitEventAck).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        init_event(&mut reader, &mut writer, 0xDEAD_BEEF).unwrap();
        responder.join().unwrap();
    }

    #[test]
    fn init_fail_is_reported_with_reason() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer
                .send(&Packet::InitFail {
                    reason: 0x0000_0002,
                })
                .unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let err = init_command(&mut reader, &mut writer, &Initiator::default()).unwrap_err();
        responder.join().unwrap();

        assert!(matches!(
            err,
            SessionError::InitFailed {
                reason: 0x0000_0002
            }
        ));
    }

    #[test]
    fn wrong_packet_type_is_unexpected() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer.send(&Packet::InitEventAck).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let err = init_command(&mut reader, &mut writer, &Initiator::default()).unwrap_err();
        responder.join().unwrap();

        assert!(matches!(
            err,
            SessionError::UnexpectedPacket {
                expected: PacketType::InitCommandAck,
                got: PacketType::InitEventAck,
            }
        ));
    }
}
