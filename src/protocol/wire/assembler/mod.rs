//! Stream reassembly: rebuilds encoded frames from a byte stream that may
//! split or merge them arbitrarily (TCP segments, serial chunks).
//!
//! The three-byte prefix announces the total length, so no delimiter is
//! needed. A prefix that cannot start a frame discards the buffered bytes
//! and reassembly resumes with the next byte.
use crate::error::DeserializationError;
use crate::protocol::wire::{encoded_len, WireFrame, MAX_WIRE_LEN, PREFIX_LEN};

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum AssembleResult {
    /// Byte stored, frame not complete yet.
    Pending,
    /// A complete frame was decoded.
    Complete(WireFrame),
    /// Buffered bytes did not form a valid frame and were dropped.
    Discarded(DeserializationError),
}

/// Single-slot reassembly buffer.
#[derive(Debug, Clone)]
pub struct WireAssembler {
    buffer: [u8; MAX_WIRE_LEN],
    len: usize,
    expected: Option<usize>,
}

impl Default for WireAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl WireAssembler {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_WIRE_LEN],
            len: 0,
            expected: None,
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.len = 0;
        self.expected = None;
    }

    /// Bytes of the frame in progress.
    pub fn buffered(&self) -> usize {
        self.len
    }

    //==================================================================================Process Functions
    /// Feed one byte of the stream.
    pub fn process_byte(&mut self, byte: u8) -> AssembleResult {
        self.buffer[self.len] = byte;
        self.len += 1;

        if self.expected.is_none() && self.len == PREFIX_LEN {
            match encoded_len(&self.buffer[..PREFIX_LEN]) {
                Ok(total) => self.expected = Some(total),
                Err(err) => {
                    self.reset();
                    return AssembleResult::Discarded(err);
                }
            }
        }

        match self.expected {
            Some(total) if self.len == total => {
                let result = WireFrame::decode(&self.buffer[..total]);
                self.reset();
                match result {
                    Ok((frame, _)) => AssembleResult::Complete(frame),
                    Err(err) => AssembleResult::Discarded(err),
                }
            }
            _ => AssembleResult::Pending,
        }
    }

    /// Feed a chunk, handing every completed or discarded frame to `sink`.
    /// Returns the number of frames completed.
    pub fn process_slice<F>(&mut self, bytes: &[u8], mut sink: F) -> usize
    where
        F: FnMut(AssembleResult),
    {
        let mut completed = 0;
        for &byte in bytes {
            match self.process_byte(byte) {
                AssembleResult::Pending => {}
                result => {
                    if matches!(result, AssembleResult::Complete(_)) {
                        completed += 1;
                    }
                    sink(result);
                }
            }
        }
        completed
    }
}
