use crate::error::{Result, WireError};

/// Growth unit used when a buffer is created with zero capacity.
const SMALL_BUFFER_SIZE: usize = 64;

/// A growable byte buffer with an explicit write offset.
///
/// Outgoing packets are staged here before hitting the socket, and the
/// data-phase assembler accumulates inbound payloads in one. The buffer
/// grows in multiples of its initial capacity, so repeated small writes
/// settle into a stable allocation pattern.
#[derive(Debug)]
pub struct WriteBuffer {
    buf: Vec<u8>,
    off: usize,
    unit: usize,
}

impl WriteBuffer {
    /// Create a buffer with the given initial capacity.
    ///
    /// The initial capacity also becomes the growth unit; zero selects a
    /// 64-byte unit.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(initial_capacity),
            off: 0,
            unit: if initial_capacity == 0 {
                SMALL_BUFFER_SIZE
            } else {
                initial_capacity
            },
        }
    }

    /// The populated prefix of the buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Current populated length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current allocated capacity.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Move the write offset without touching contents.
    pub fn seek(&mut self, offset: usize) {
        self.off = offset;
    }

    /// Current write offset.
    pub fn tell(&self) -> usize {
        self.off
    }

    /// Drop all contents and reset the write offset, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.off = 0;
    }

    /// Extend the populated length by `n` bytes, growing if needed.
    pub fn grow(&mut self, n: usize) -> Result<()> {
        let required = self.buf.len() + n;
        self.ensure_len(required)
    }

    /// Write at the current offset, advancing it. Returns the byte count.
    pub fn write(&mut self, p: &[u8]) -> Result<usize> {
        let end = self.off + p.len();
        self.ensure_len(end)?;
        self.buf[self.off..end].copy_from_slice(p);
        self.off = end;
        Ok(p.len())
    }

    /// Relocate the write offset and write there.
    ///
    /// An offset past the current length zero-fills the gap.
    pub fn write_at(&mut self, p: &[u8], offset: usize) -> Result<usize> {
        self.off = offset;
        self.write(p)
    }

    /// Write a little-endian u16 at the current offset.
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    /// Write a little-endian u32 at the current offset.
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    /// Write a little-endian u64 at the current offset.
    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    /// Write raw bytes at the current offset.
    pub fn write_raw(&mut self, p: &[u8]) -> Result<()> {
        self.write(p).map(|_| ())
    }

    /// Make the populated length at least `required`.
    ///
    /// When the capacity is insufficient, the new capacity is the smallest
    /// multiple of the growth unit that covers `required`. New bytes are
    /// zero-filled.
    fn ensure_len(&mut self, required: usize) -> Result<()> {
        if required <= self.buf.len() {
            return Ok(());
        }
        if required > self.buf.capacity() {
            let target = required
                .checked_next_multiple_of(self.unit)
                .ok_or(WireError::AllocationTooLarge { requested: required })?;
            let additional = target - self.buf.len();
            self.buf
                .try_reserve_exact(additional)
                .map_err(|_| WireError::AllocationTooLarge { requested: target })?;
        }
        self.buf.resize(required, 0);
        Ok(())
    }
}
