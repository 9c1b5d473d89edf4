use std::io::{Read, Write};

use bytes::Bytes;
use ptpip_wire::{Packet, PacketReader, PacketType, PacketWriter, WriteBuffer};
use tracing::{debug, trace, warn};

use crate::codes::RC_OK;
use crate::error::{Result, SessionError};

/// Initial capacity of the data-phase assembly buffer.
const ASSEMBLY_BUFFER_CAPACITY: usize = 64;

/// Which way the bulk data of an operation flows.
///
/// PTP/IP encodes these as distinct DataPhaseInfo values on the wire, but
/// the transfer direction is always selected by the caller-supplied variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPhase {
    /// The device may send a data-in phase, or no data at all.
    NoDataOrIn,
    /// The caller supplies a data-out payload.
    Out,
}

impl DataPhase {
    /// The DataPhaseInfo field value for the OperationRequest packet.
    pub fn wire_value(self) -> u32 {
        match self {
            Self::NoDataOrIn => 0x0000_0001,
            Self::Out => 0x0000_0002,
        }
    }
}

/// One PTP operation as the caller describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub data_phase: DataPhase,
    /// 16-bit PTP operation code (opaque to the transport).
    pub operation_code: u16,
    /// Initiator-chosen transaction id correlating response and data packets.
    pub transaction_id: u32,
    pub params: [u32; 4],
}

/// Execute one operation on the command channel.
///
/// Drives request, optional data phase in either direction, and response.
/// Returns the device's data-in payload, empty when the device sent none.
pub fn execute<R: Read, W: Write>(
    reader: &mut PacketReader<R>,
    writer: &mut PacketWriter<W>,
    request: &OperationRequest,
    send_data: Option<&[u8]>,
) -> Result<Bytes> {
    debug!(
        operation_code = format_args!("0x{:04x}", request.operation_code),
        transaction_id = request.transaction_id,
        data_phase = ?request.data_phase,
        "operation request"
    );

    writer.send(&Packet::OperationRequest {
        data_phase: request.data_phase.wire_value(),
        operation_code: request.operation_code,
        transaction_id: request.transaction_id,
        params: request.params,
    })?;

    match request.data_phase {
        DataPhase::Out => {
            let payload = match send_data {
                Some(data) if !data.is_empty() => data,
                _ => return Err(SessionError::EmptyDataOut),
            };
            send_data_phase(writer, request.transaction_id, payload)?;
            check_response(reader.read_packet()?)?;
            Ok(Bytes::new())
        }
        DataPhase::NoDataOrIn => {
            // Devices answer no-data operations with OperationResponse
            // directly; only enter the assembler once data actually starts.
            let first = reader.read_packet()?;
            if matches!(first, Packet::OperationResponse { .. }) {
                check_response(first)?;
                return Ok(Bytes::new());
            }
            let data = assemble(reader, first)?;
            check_response(reader.read_packet()?)?;
            Ok(data)
        }
    }
}

/// Transmit a data-out payload as the StartData / Data / EndData burst.
fn send_data_phase<W: Write>(
    writer: &mut PacketWriter<W>,
    transaction_id: u32,
    payload: &[u8],
) -> Result<()> {
    writer.send(&Packet::StartData {
        transaction_id,
        total_length: payload.len() as u64,
    })?;
    writer.send(&Packet::Data {
        transaction_id,
        payload: Bytes::copy_from_slice(payload),
    })?;
    writer.send(&Packet::EndData {
        transaction_id,
        payload: Bytes::new(),
    })?;
    Ok(())
}

/// Collect an inbound data phase starting from an already-received packet.
///
/// Consumes StartData / Data* / EndData and verifies the accumulated
/// length against the declared total.
fn assemble<R: Read>(reader: &mut PacketReader<R>, first: Packet) -> Result<Bytes> {
    let mut buf = WriteBuffer::new(ASSEMBLY_BUFFER_CAPACITY);
    let mut declared: u64 = 0;
    let mut packet = first;

    loop {
        match packet {
            Packet::StartData { total_length, .. } => {
                trace!(total_length, "data phase start");
                declared = total_length;
            }
            Packet::Data { ref payload, .. } => {
                buf.write_raw(payload)?;
            }
            Packet::EndData { ref payload, .. } => {
                buf.write_raw(payload)?;
                break;
            }
            ref other => {
                warn!(packet = %other.packet_type(), "ignoring packet during data phase");
            }
        }
        packet = reader.read_packet()?;
    }

    let received = buf.len() as u64;
    if received != declared {
        return Err(SessionError::DataLengthMismatch { received, declared });
    }
    Ok(Bytes::copy_from_slice(buf.bytes()))
}

/// Classify the OperationResponse that terminates every transaction.
fn check_response(packet: Packet) -> Result<()> {
    match packet {
        Packet::OperationResponse {
            response_code,
            transaction_id,
            ..
        } => {
            if response_code != RC_OK {
                return Err(SessionError::DeviceRefused {
                    code: response_code,
                });
            }
            trace!(transaction_id, "operation ok");
            Ok(())
        }
        other => Err(SessionError::unexpected(
            PacketType::OperationResponse,
            &other,
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::os::unix::net::UnixStream;
    use std::thread;

    use super::*;

    fn split(stream: UnixStream) -> (PacketReader<UnixStream>, PacketWriter<UnixStream>) {
        let reader = PacketReader::new(stream.try_clone().unwrap());
        (reader, PacketWriter::new(stream))
    }

    fn ok_response(transaction_id: u32) -> Packet {
        Packet::OperationResponse {
            response_code: RC_OK,
            transaction_id,
            params: [0; 4],
        }
    }

    #[test]
    fn data_in_payload_is_assembled() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let request = reader.read_packet().unwrap();
            assert!(matches!(
                request,
                Packet::OperationRequest {
                    operation_code: 0x1001,
                    ..
                }
            ));

            writer
                .send(&Packet::StartData {
                    transaction_id: 1,
                    total_length: 5,
                })
                .unwrap();
            writer
                .send(&Packet::Data {
                    transaction_id: 1,
                    payload: Bytes::from_static(b"Hell"),
                })
                .unwrap();
            writer
                .send(&Packet::EndData {
                    transaction_id: 1,
                    payload: Bytes::from_static(b"o"),
                })
                .unwrap();
            writer.send(&ok_response(1)).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001,
            transaction_id: 1,
            params: [0; 4],
        };
        let data = execute(&mut reader, &mut writer, &request, None).unwrap();
        responder.join().unwrap();

        assert_eq!(data.as_ref(), b"Hello");
    }

    #[test]
    fn data_out_burst_carries_transaction_id() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);

            let request = reader.read_packet().unwrap();
            let Packet::OperationRequest { transaction_id, .. } = request else {
                panic!("expected OperationRequest, got {request:?}");
            };
            assert_eq!(transaction_id, 7);

            assert_eq!(
                reader.read_packet().unwrap(),
                Packet::StartData {
                    transaction_id: 7,
                    total_length: 3,
                }
            );
            assert_eq!(
                reader.read_packet().unwrap(),
                Packet::Data {
                    transaction_id: 7,
                    payload: Bytes::from_static(&[0xAA, 0xBB, 0xCC]),
                }
            );
            assert_eq!(
                reader.read_packet().unwrap(),
                Packet::EndData {
                    transaction_id: 7,
                    payload: Bytes::new(),
                }
            );

            writer.send(&ok_response(7)).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::Out,
            operation_code: 0x100D,
            transaction_id: 7,
            params: [0; 4],
        };
        let data = execute(
            &mut reader,
            &mut writer,
            &request,
            Some(&[0xAA, 0xBB, 0xCC]),
        )
        .unwrap();
        responder.join().unwrap();

        assert!(data.is_empty());
    }

    #[test]
    fn degenerate_data_in_returns_empty() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer.send(&ok_response(2)).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1002,
            transaction_id: 2,
            params: [1, 0, 0, 0],
        };
        let data = execute(&mut reader, &mut writer, &request, None).unwrap();
        responder.join().unwrap();

        assert!(data.is_empty());
    }

    #[test]
    fn refused_response_carries_code() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer
                .send(&Packet::OperationResponse {
                    response_code: crate::codes::RC_DEVICE_BUSY,
                    transaction_id: 3,
                    params: [0; 4],
                })
                .unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001,
            transaction_id: 3,
            params: [0; 4],
        };
        let err = execute(&mut reader, &mut writer, &request, None).unwrap_err();
        responder.join().unwrap();

        assert!(matches!(
            err,
            SessionError::DeviceRefused { code: 0x2019 }
        ));
    }

    #[test]
    fn length_mismatch_is_detected() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer
                .send(&Packet::StartData {
                    transaction_id: 4,
                    total_length: 10,
                })
                .unwrap();
            writer
                .send(&Packet::EndData {
                    transaction_id: 4,
                    payload: Bytes::from_static(b"abc"),
                })
                .unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001,
            transaction_id: 4,
            params: [0; 4],
        };
        let err = execute(&mut reader, &mut writer, &request, None).unwrap_err();
        responder.join().unwrap();

        assert!(matches!(
            err,
            SessionError::DataLengthMismatch {
                received: 3,
                declared: 10,
            }
        ));
    }

    #[test]
    fn empty_data_out_is_rejected_before_any_read() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()));
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));
        let request = OperationRequest {
            data_phase: DataPhase::Out,
            operation_code: 0x100D,
            transaction_id: 5,
            params: [0; 4],
        };

        let err = execute(&mut reader, &mut writer, &request, Some(&[])).unwrap_err();
        assert!(matches!(err, SessionError::EmptyDataOut));

        let err = execute(&mut reader, &mut writer, &request, None).unwrap_err();
        assert!(matches!(err, SessionError::EmptyDataOut));
    }

    #[test]
    fn non_response_after_data_phase_is_unexpected() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer
                .send(&Packet::StartData {
                    transaction_id: 6,
                    total_length: 0,
                })
                .unwrap();
            writer
                .send(&Packet::EndData {
                    transaction_id: 6,
                    payload: Bytes::new(),
                })
                .unwrap();
            writer
                .send(&Packet::Event {
                    event_code: 0x4002,
                    transaction_id: 6,
                    params: [0; 3],
                })
                .unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001,
            transaction_id: 6,
            params: [0; 4],
        };
        let err = execute(&mut reader, &mut writer, &request, None).unwrap_err();
        responder.join().unwrap();

        assert!(matches!(
            err,
            SessionError::UnexpectedPacket {
                expected: PacketType::OperationResponse,
                got: PacketType::Event,
            }
        ));
    }

    #[test]
    fn stray_packets_inside_data_phase_are_ignored() {
        let (left, right) = UnixStream::pair().unwrap();

        let responder = thread::spawn(move || {
            let (mut reader, mut writer) = split(left);
            let _ = reader.read_packet().unwrap();
            writer
                .send(&Packet::StartData {
                    transaction_id: 8,
                    total_length: 2,
                })
                .unwrap();
            // A probe leaking onto the command channel must not corrupt
            // the assembly.
            writer.send(&Packet::ProbeRequest).unwrap();
            writer
                .send(&Packet::EndData {
                    transaction_id: 8,
                    payload: Bytes::from_static(b"ok"),
                })
                .unwrap();
            writer.send(&ok_response(8)).unwrap();
        });

        let (mut reader, mut writer) = split(right);
        let request = OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001,
            transaction_id: 8,
            params: [0; 4],
        };
        let data = execute(&mut reader, &mut writer, &request, None).unwrap();
        responder.join().unwrap();

        assert_eq!(data.as_ref(), b"ok");
    }
}
