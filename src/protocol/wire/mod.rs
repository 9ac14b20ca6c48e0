//! Byte-array protocol carrying data, API and error frames over a socket.
//!
//! Every frame kind shares one layout, all multi-byte fields big-endian:
//!
//! ```text
//! offset  size  field
//! 0       1     discriminator (0 = API, 1 = data, 2 = error)
//! 1       1     control byte (format and flags, see `infra::codec::bits`)
//! 2       1     DLC
//! 3       4     identifier
//! 7       n     payload, n = resolved data size (0 for remote frames)
//! 7+n     4     marker
//! 11+n    4     user
//! 15+n    4     timestamp seconds
//! 19+n    4     timestamp nanoseconds
//! 23+n    2     CRC-16/IBM-SDLC over bytes 0..23+n
//! ```
//!
//! The first three bytes announce the total length, so a receiver can split
//! a byte stream and demultiplex kinds without side information.
use crc::{Crc, CRC_16_IBM_SDLC};

use crate::core::MAX_FD_PAYLOAD;
use crate::error::{DeserializationError, SerializationError};
use crate::infra::codec::bits::ControlField;
use crate::infra::codec::bytes::{ByteReader, ByteWriter};
use crate::infra::codec::dlc::{clamp_dlc, dlc_to_size};
use crate::infra::codec::traits::{FromByteArray, ToByteArray};
use crate::protocol::frame::{ApiFrame, CanFrame, ErrorFrame, Timestamp};

pub mod assembler;

//==================================================================================LAYOUT

/// Discriminator, control byte and DLC: enough to compute the total length.
pub const PREFIX_LEN: usize = 3;
/// Prefix plus identifier.
pub const HEADER_LEN: usize = PREFIX_LEN + 4;
/// Marker, user and both timestamp words.
pub const TAGS_LEN: usize = 16;
pub const CHECKSUM_LEN: usize = 2;
/// Encoded size of a frame without payload.
pub const MIN_WIRE_LEN: usize = HEADER_LEN + TAGS_LEN + CHECKSUM_LEN;
/// Encoded size of a 64-byte FD frame.
pub const MAX_WIRE_LEN: usize = MIN_WIRE_LEN + MAX_FD_PAYLOAD;

/// Owned encoded frame.
pub type WireBuffer = heapless::Vec<u8, MAX_WIRE_LEN>;

const WIRE_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

//==================================================================================FRAME_KIND
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Leading discriminator byte.
pub enum FrameKind {
    Api = 0,
    Data = 1,
    Error = 2,
}

impl FrameKind {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameKind::Api),
            1 => Some(FrameKind::Data),
            2 => Some(FrameKind::Error),
            _ => None,
        }
    }
}

/// Kind of the encoded frame starting at `bytes[0]`.
pub fn peek_kind(bytes: &[u8]) -> Result<FrameKind, DeserializationError> {
    let first = *bytes.first().ok_or(DeserializationError::Truncated {
        needed: PREFIX_LEN,
        available: 0,
    })?;
    FrameKind::from_u8(first).ok_or(DeserializationError::UnknownDiscriminator(first))
}

/// Total encoded length announced by the first [`PREFIX_LEN`] bytes.
pub fn encoded_len(prefix: &[u8]) -> Result<usize, DeserializationError> {
    if prefix.len() < PREFIX_LEN {
        return Err(DeserializationError::Truncated {
            needed: PREFIX_LEN,
            available: prefix.len(),
        });
    }
    peek_kind(prefix)?;
    let ctrl = ControlField::from_bits(prefix[1])
        .ok_or(DeserializationError::ReservedBits(prefix[1]))?;
    let dlc = prefix[2];
    if clamp_dlc(ctrl.format(), dlc) != dlc {
        return Err(DeserializationError::InvalidDlc {
            dlc,
            format: ctrl.format(),
        });
    }
    let payload = if ctrl.is_remote() {
        0
    } else {
        dlc_to_size(ctrl.format(), dlc)
    };
    Ok(MIN_WIRE_LEN + payload)
}

//==================================================================================ENCODE

fn wire_len(frame: &CanFrame) -> usize {
    if frame.is_remote() {
        MIN_WIRE_LEN
    } else {
        MIN_WIRE_LEN + frame.data_size()
    }
}

fn encode(kind: FrameKind, frame: &CanFrame, buffer: &mut [u8]) -> Result<usize, SerializationError> {
    let needed = wire_len(frame);
    if buffer.len() < needed {
        return Err(SerializationError::BufferTooSmall {
            needed,
            available: buffer.len(),
        });
    }
    let mut writer = ByteWriter::new(&mut buffer[..needed]);
    writer.write_u8(kind as u8)?;
    writer.write_u8(frame.control().bits())?;
    writer.write_u8(frame.dlc())?;
    writer.write_u32(frame.identifier())?;
    if !frame.is_remote() {
        writer.write_slice(frame.data())?;
    }
    writer.write_u32(frame.marker())?;
    writer.write_u32(frame.user())?;
    writer.write_u32(frame.timestamp().seconds())?;
    writer.write_u32(frame.timestamp().nanoseconds())?;
    let checksum = WIRE_CRC.checksum(writer.written());
    writer.write_u16(checksum)?;
    Ok(writer.position())
}

//==================================================================================DECODE

/// Decode any kind. Returns the kind, the frame storage and the number of
/// bytes consumed; trailing bytes are left alone.
fn decode(bytes: &[u8]) -> Result<(FrameKind, CanFrame, usize), DeserializationError> {
    let len = encoded_len(bytes)?;
    if bytes.len() < len {
        return Err(DeserializationError::Truncated {
            needed: len,
            available: bytes.len(),
        });
    }
    let (body, trailer) = bytes[..len].split_at(len - CHECKSUM_LEN);
    let found = u16::from_be_bytes([trailer[0], trailer[1]]);
    let expected = WIRE_CRC.checksum(body);
    if found != expected {
        return Err(DeserializationError::ChecksumMismatch { expected, found });
    }

    let mut reader = ByteReader::new(body);
    let kind = peek_kind(reader.read_slice(1)?)?;
    let ctrl_bits = reader.read_u8()?;
    let ctrl = ControlField::from_bits(ctrl_bits).ok_or(DeserializationError::ReservedBits(ctrl_bits))?;
    let dlc = reader.read_u8()?;
    let identifier = reader.read_u32()?;
    let format = ctrl.format();
    if identifier & !format.id_mask() != 0 {
        return Err(DeserializationError::InvalidIdentifier { identifier, format });
    }
    let payload_len = len - MIN_WIRE_LEN;
    let payload = reader.read_slice(payload_len)?;
    let marker = reader.read_u32()?;
    let user = reader.read_u32()?;
    let seconds = reader.read_u32()?;
    let nanoseconds = reader.read_u32()?;

    let frame = CanFrame::from_parts(
        ctrl,
        identifier,
        dlc,
        payload,
        marker,
        user,
        Timestamp::from_raw(seconds, nanoseconds),
    );
    Ok((kind, frame, len))
}

fn decode_kind(bytes: &[u8], expected: FrameKind) -> Result<CanFrame, DeserializationError> {
    let found = peek_kind(bytes)?;
    if found != expected {
        return Err(DeserializationError::KindMismatch { expected, found });
    }
    decode(bytes).map(|(_, frame, _)| frame)
}

//==================================================================================FRAME_IMPLS

impl ToByteArray for CanFrame {
    fn to_byte_array(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        encode(FrameKind::Data, self, buffer)
    }

    fn byte_array_len(&self) -> usize {
        wire_len(self)
    }
}

impl FromByteArray for CanFrame {
    fn from_byte_array(bytes: &[u8]) -> Result<Self, DeserializationError> {
        decode_kind(bytes, FrameKind::Data)
    }
}

impl ToByteArray for ApiFrame {
    fn to_byte_array(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        encode(FrameKind::Api, self.as_frame(), buffer)
    }

    fn byte_array_len(&self) -> usize {
        wire_len(self.as_frame())
    }
}

impl FromByteArray for ApiFrame {
    fn from_byte_array(bytes: &[u8]) -> Result<Self, DeserializationError> {
        let frame = decode_kind(bytes, FrameKind::Api)?;
        ApiFrame::from_frame(frame).ok_or(DeserializationError::InvalidPayload {
            kind: FrameKind::Api,
        })
    }
}

impl ToByteArray for ErrorFrame {
    fn to_byte_array(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        encode(FrameKind::Error, self.as_frame(), buffer)
    }

    fn byte_array_len(&self) -> usize {
        wire_len(self.as_frame())
    }
}

impl FromByteArray for ErrorFrame {
    fn from_byte_array(bytes: &[u8]) -> Result<Self, DeserializationError> {
        let frame = decode_kind(bytes, FrameKind::Error)?;
        ErrorFrame::from_frame(frame).ok_or(DeserializationError::InvalidPayload {
            kind: FrameKind::Error,
        })
    }
}

//==================================================================================WIRE_FRAME
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Any frame kind, as demultiplexed from the wire.
pub enum WireFrame {
    Data(CanFrame),
    Api(ApiFrame),
    Error(ErrorFrame),
}

impl WireFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            WireFrame::Data(_) => FrameKind::Data,
            WireFrame::Api(_) => FrameKind::Api,
            WireFrame::Error(_) => FrameKind::Error,
        }
    }

    fn storage(&self) -> &CanFrame {
        match self {
            WireFrame::Data(frame) => frame,
            WireFrame::Api(api) => api.as_frame(),
            WireFrame::Error(error) => error.as_frame(),
        }
    }

    /// Decode the frame at the start of `bytes`, selecting the type from
    /// the discriminator. Returns the frame and the bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DeserializationError> {
        let (kind, frame, len) = decode(bytes)?;
        let wire = match kind {
            FrameKind::Data => WireFrame::Data(frame),
            FrameKind::Api => WireFrame::Api(
                ApiFrame::from_frame(frame).ok_or(DeserializationError::InvalidPayload { kind })?,
            ),
            FrameKind::Error => WireFrame::Error(
                ErrorFrame::from_frame(frame)
                    .ok_or(DeserializationError::InvalidPayload { kind })?,
            ),
        };
        Ok((wire, len))
    }
}

impl ToByteArray for WireFrame {
    fn to_byte_array(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        encode(self.kind(), self.storage(), buffer)
    }

    fn byte_array_len(&self) -> usize {
        wire_len(self.storage())
    }
}

impl FromByteArray for WireFrame {
    fn from_byte_array(bytes: &[u8]) -> Result<Self, DeserializationError> {
        WireFrame::decode(bytes).map(|(frame, _)| frame)
    }
}

impl From<CanFrame> for WireFrame {
    fn from(frame: CanFrame) -> Self {
        WireFrame::Data(frame)
    }
}

impl From<ApiFrame> for WireFrame {
    fn from(api: ApiFrame) -> Self {
        WireFrame::Api(api)
    }
}

impl From<ErrorFrame> for WireFrame {
    fn from(error: ErrorFrame) -> Self {
        WireFrame::Error(error)
    }
}
