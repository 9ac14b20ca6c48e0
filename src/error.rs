//! Error definitions shared across library modules.
//! `CanError` is the status vocabulary of transports and driver backends;
//! the remaining enums model structural failures of the pure layers
//! (filter rules, byte-array encoding and decoding, byte cursors).
use crate::core::FrameFormat;
use crate::protocol::wire::FrameKind;
use thiserror_no_std::Error;

//==================================================================================CAN_STATUS

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Status returned by transport sockets and driver backends.
///
/// Success is `Ok(())`; every other condition of the status vocabulary is a variant.
pub enum CanError {
    /// The socket or interface is not connected to a network.
    #[error("not connected to a CAN network")]
    NotConnected,
    /// The requested backend could not be located or loaded.
    #[error("failed to load the interface backend")]
    LibraryLoadFailed,
    /// Transmit FIFO full, retry later.
    #[error("transmit FIFO is full")]
    FifoTransmitFull,
    /// Nothing to read yet.
    #[error("receive FIFO is empty")]
    FifoReceiveEmpty,
    /// Bitrate not supported by the interface.
    #[error("invalid bitrate")]
    InvalidBitrate,
    /// Interface initialisation failed.
    #[error("interface initialisation failed")]
    InitFail,
    /// Operation requires an initialised interface.
    #[error("interface is not initialised")]
    InitMissing,
    /// Operation not supported by this interface or in this mode.
    #[error("operation not supported")]
    NotSupported,
    #[error("generic failure")]
    GenericFailure,
}

impl CanError {
    /// Stable numeric code (0 is reserved for success).
    pub const fn code(self) -> i32 {
        match self {
            CanError::NotConnected => 1,
            CanError::LibraryLoadFailed => 2,
            CanError::FifoTransmitFull => 3,
            CanError::FifoReceiveEmpty => 4,
            CanError::InvalidBitrate => 5,
            CanError::InitFail => 6,
            CanError::InitMissing => 7,
            CanError::NotSupported => 8,
            CanError::GenericFailure => 9,
        }
    }

    /// Inverse of [`CanError::code`]. Code 0 and unknown codes yield `None`.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(CanError::NotConnected),
            2 => Some(CanError::LibraryLoadFailed),
            3 => Some(CanError::FifoTransmitFull),
            4 => Some(CanError::FifoReceiveEmpty),
            5 => Some(CanError::InvalidBitrate),
            6 => Some(CanError::InitFail),
            7 => Some(CanError::InitMissing),
            8 => Some(CanError::NotSupported),
            9 => Some(CanError::GenericFailure),
            _ => None,
        }
    }

    /// Steady-state conditions (empty FIFO on poll, full FIFO under
    /// backpressure) as opposed to real faults.
    pub const fn is_benign(self) -> bool {
        matches!(self, CanError::FifoReceiveEmpty | CanError::FifoTransmitFull)
    }
}

/// Outcome of a transport or backend operation.
pub type CanResult<T = ()> = Result<T, CanError>;

//================================================================================FILTER_ERROR

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Invalid filter rule or filter list operation.
pub enum FilterError {
    /// Lower bound above upper bound.
    #[error("invalid identifier range: {low:#x} > {high:#x}")]
    InvalidRange { low: u32, high: u32 },
    /// Upper bound outside the identifier space of the rule's format.
    #[error("identifier {high:#x} exceeds mask {mask:#x}")]
    IdentifierOutOfRange { high: u32, mask: u32 },
    #[error("filter list is full")]
    ListFull,
    #[error("no filter at index {index} (list holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

//================================================================================CODEC_ERROR

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Issues encountered while encoding a frame into a byte array.
pub enum SerializationError {
    /// Provided buffer is too small for the encoded frame.
    #[error("buffer too small: {needed} bytes needed, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("byte write error: {err}")]
    ByteWrite { err: ByteWriterError },
}

impl From<ByteWriterError> for SerializationError {
    fn from(err: ByteWriterError) -> Self {
        SerializationError::ByteWrite { err }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while decoding a byte array into a frame object.
pub enum DeserializationError {
    /// Input ends before the length implied by its header.
    #[error("truncated input: {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },
    /// Leading byte is not a known frame kind.
    #[error("unknown frame discriminator {0:#04x}")]
    UnknownDiscriminator(u8),
    /// Valid frame of another kind than the one requested.
    #[error("expected {expected:?} frame, found {found:?}")]
    KindMismatch { expected: FrameKind, found: FrameKind },
    /// Reserved bits of the control byte are set.
    #[error("reserved control bits set: {0:#04x}")]
    ReservedBits(u8),
    /// DLC outside the range of the frame format.
    #[error("DLC {dlc} invalid for {format:?}")]
    InvalidDlc { dlc: u8, format: FrameFormat },
    /// Identifier wider than the frame format allows.
    #[error("identifier {identifier:#x} invalid for {format:?}")]
    InvalidIdentifier { identifier: u32, format: FrameFormat },
    /// Payload does not hold valid arguments for the frame kind
    /// (unknown API function, unknown bus state or error type).
    #[error("invalid payload for {kind:?} frame")]
    InvalidPayload { kind: FrameKind },
    /// Checksum trailer does not match the content.
    #[error("checksum mismatch: expected {expected:#06x}, found {found:#06x}")]
    ChecksumMismatch { expected: u16, found: u16 },
    #[error("byte read error: {err}")]
    ByteRead { err: ByteReaderError },
}

impl From<ByteReaderError> for DeserializationError {
    fn from(err: ByteReaderError) -> Self {
        DeserializationError::ByteRead { err }
    }
}

//================================================================================BYTE_CURSOR_ERRORS

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors returned by [`ByteReader`](crate::infra::codec::bytes::ByteReader).
pub enum ByteReaderError {
    /// Attempt to read beyond the end of the input.
    #[error("read out of bounds: asked {asked} bytes, {available} available")]
    OutOfBounds { asked: usize, available: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors returned by [`ByteWriter`](crate::infra::codec::bytes::ByteWriter).
pub enum ByteWriterError {
    /// Attempt to write beyond the end of the buffer.
    #[error("write out of bounds: asked {asked} bytes, {available} available")]
    OutOfBounds { asked: usize, available: usize },
}

//================================================================================LINK_ERROR

#[derive(Error, Debug)]
/// Failure while pushing an encoded frame through a socket link.
pub enum SendFrameError<E: core::fmt::Debug> {
    #[error("frame encoding failed: {0}")]
    Serialization(SerializationError),
    /// Link refused the bytes.
    #[error("link send error: {0:?}")]
    Link(E),
}
