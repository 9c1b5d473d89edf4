use std::io::{ErrorKind, Write};

use tracing::trace;

use crate::buffer::WriteBuffer;
use crate::error::{Result, WireError};
use crate::packet::{encode_packet, Packet};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Writes complete PTP/IP packets to any `Write` stream.
#[derive(Debug)]
pub struct PacketWriter<T> {
    inner: T,
    buf: WriteBuffer,
}

impl<T: Write> PacketWriter<T> {
    /// Create a packet writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: WriteBuffer::new(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one packet (blocking).
    pub fn send(&mut self, packet: &Packet) -> Result<()> {
        self.buf.reset();
        encode_packet(packet, &mut self.buf)?;

        let wire = self.buf.bytes();
        let mut offset = 0usize;
        while offset < wire.len() {
            match self.inner.write(&wire[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        trace!(packet_type = %packet.packet_type(), len = wire.len(), "packet sent");
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
