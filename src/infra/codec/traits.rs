//! Byte-array traits implemented by every frame kind carried on the wire.
//! They decouple the frame objects from transports that only move bytes.
use crate::error::{DeserializationError, SerializationError};
use crate::protocol::wire::{WireBuffer, MAX_WIRE_LEN};

//==================================================================================TO_BYTE_ARRAY
/// Encode a frame into its tagged byte-array form.
pub trait ToByteArray {
    /// Encode into `buffer` and return the number of bytes written.
    fn to_byte_array(&self, buffer: &mut [u8]) -> Result<usize, SerializationError>;

    /// Exact encoded length of this instance.
    fn byte_array_len(&self) -> usize;

    /// Encode into an owned fixed-capacity buffer.
    fn to_wire_buffer(&self) -> Result<WireBuffer, SerializationError> {
        let mut buffer = [0u8; MAX_WIRE_LEN];
        let len = self.to_byte_array(&mut buffer)?;
        WireBuffer::from_slice(&buffer[..len]).map_err(|_| SerializationError::BufferTooSmall {
            needed: len,
            available: MAX_WIRE_LEN,
        })
    }
}
//==================================================================================FROM_BYTE_ARRAY
/// Decode a tagged byte array into a frame object.
pub trait FromByteArray: Sized {
    /// Decode `bytes`. Fails on a discriminator of another frame kind,
    /// short input or any structural violation.
    fn from_byte_array(bytes: &[u8]) -> Result<Self, DeserializationError>;

    /// Decode into `self`. On failure `self` is left untouched.
    fn load_byte_array(&mut self, bytes: &[u8]) -> Result<(), DeserializationError> {
        *self = Self::from_byte_array(bytes)?;
        Ok(())
    }
}
