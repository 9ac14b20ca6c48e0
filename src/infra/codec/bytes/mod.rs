//! Byte cursors used by the wire protocol. Multi-byte values are big-endian
//! (most significant byte first).
use crate::error::{ByteReaderError, ByteWriterError};

/// Reader over a `&[u8]`, no copies.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Borrow the next `len` bytes and advance.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ByteReaderError> {
        if len > self.remaining() {
            return Err(ByteReaderError::OutOfBounds {
                asked: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ByteReaderError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read_slice(N)?);
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ByteReaderError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ByteReaderError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ByteReaderError> {
        self.read_array().map(u32::from_be_bytes)
    }
}

//==================================================================================BYTEWRITER

/// Writer filling a `&mut [u8]` from the start.
pub struct ByteWriter<'a> {
    buffer: &'a mut [u8],
    cursor: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    pub fn write_slice(&mut self, slice: &[u8]) -> Result<(), ByteWriterError> {
        let available = self.buffer.len() - self.cursor;
        if slice.len() > available {
            return Err(ByteWriterError::OutOfBounds {
                asked: slice.len(),
                available,
            });
        }
        self.buffer[self.cursor..self.cursor + slice.len()].copy_from_slice(slice);
        self.cursor += slice.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), ByteWriterError> {
        self.write_slice(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), ByteWriterError> {
        self.write_slice(&value.to_be_bytes())
    }
}

//==================================================================================TEST_BYTE_CURSORS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
