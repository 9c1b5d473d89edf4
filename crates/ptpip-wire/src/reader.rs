use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::error::{Result, WireError};
use crate::packet::{try_decode, Packet, DEFAULT_MAX_PACKET};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete PTP/IP packets from any `Read` stream.
///
/// Handles short reads internally — callers always get complete packets.
#[derive(Debug)]
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    max_packet_size: usize,
}

impl<T: Read> PacketReader<T> {
    /// Create a packet reader with the default maximum packet size.
    pub fn new(inner: T) -> Self {
        Self::with_max_packet(inner, DEFAULT_MAX_PACKET)
    }

    /// Create a packet reader with an explicit maximum packet size.
    pub fn with_max_packet(inner: T, max_packet_size: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_packet_size,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = try_decode(&mut self.buf, self.max_packet_size)? {
                trace!(packet_type = %packet.packet_type(), "packet received");
                return Ok(packet);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
