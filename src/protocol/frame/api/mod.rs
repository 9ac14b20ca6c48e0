//! API frames: control messages exchanged between an application and the
//! process owning a CAN interface (bitrate, mode, driver lifecycle, naming).
//!
//! An API frame reuses the data frame storage: the function code lives in
//! the marker field, its arguments in the payload.
use core::fmt;

use crate::core::{Bitrate, ByteOrder, CanMode, FrameFormat};
use crate::protocol::frame::{CanFrame, Timestamp};

/// Longest interface name carried by [`ApiFunction::Name`].
pub const MAX_API_NAME_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Function code of an API frame.
pub enum ApiFunction {
    #[default]
    None = 0,
    /// Nominal and data bitrate.
    Bitrate = 1,
    /// Controller mode.
    CanMode = 2,
    DriverInit = 3,
    DriverRelease = 4,
    /// Identifier of the sending process.
    ProcessId = 5,
    /// Interface name.
    Name = 6,
}

impl ApiFunction {
    pub const fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(ApiFunction::None),
            1 => Some(ApiFunction::Bitrate),
            2 => Some(ApiFunction::CanMode),
            3 => Some(ApiFunction::DriverInit),
            4 => Some(ApiFunction::DriverRelease),
            5 => Some(ApiFunction::ProcessId),
            6 => Some(ApiFunction::Name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Control frame routed out of band (never filtered).
pub struct ApiFrame {
    frame: CanFrame,
}

impl ApiFrame {
    pub const fn new() -> Self {
        Self {
            frame: CanFrame::new(FrameFormat::FdStandard, 0),
        }
    }

    /// Wrap a decoded frame; the marker must hold a known function code.
    pub(crate) fn from_frame(frame: CanFrame) -> Option<Self> {
        ApiFunction::from_u32(frame.marker())?;
        Some(Self { frame })
    }

    /// Underlying storage, as carried on the wire.
    pub fn as_frame(&self) -> &CanFrame {
        &self.frame
    }

    pub fn function(&self) -> ApiFunction {
        ApiFunction::from_u32(self.frame.marker()).unwrap_or_default()
    }

    fn start(&mut self, function: ApiFunction, size: usize) {
        let timestamp = self.frame.timestamp();
        self.frame.clear();
        self.frame.set_timestamp(timestamp);
        self.frame.set_marker(function as u32);
        let sized = self.frame.set_data_size(size);
        debug_assert!(sized, "API payload size {} not in the DLC table", size);
    }

    //==================================================================================BITRATE

    pub fn set_bitrate(&mut self, nominal: Bitrate, data: Bitrate) {
        self.start(ApiFunction::Bitrate, 8);
        let written = self
            .frame
            .set_data_u32(0, nominal.index() as u32, ByteOrder::MsbFirst)
            && self
                .frame
                .set_data_u32(4, data.index() as u32, ByteOrder::MsbFirst);
        debug_assert!(written);
    }

    /// `(nominal, data)` when this frame carries a bitrate request.
    pub fn bitrate(&self) -> Option<(Bitrate, Bitrate)> {
        if self.function() != ApiFunction::Bitrate {
            return None;
        }
        let nominal = self.frame.data_u32(0, ByteOrder::MsbFirst)? as i32;
        let data = self.frame.data_u32(4, ByteOrder::MsbFirst)? as i32;
        Some((Bitrate::from_index(nominal)?, Bitrate::from_index(data)?))
    }

    //==================================================================================MODE

    pub fn set_mode(&mut self, mode: CanMode) {
        self.start(ApiFunction::CanMode, 1);
        let written = self.frame.set_data_at(0, mode as u8);
        debug_assert!(written);
    }

    pub fn mode(&self) -> Option<CanMode> {
        if self.function() != ApiFunction::CanMode {
            return None;
        }
        CanMode::from_u8(self.frame.data_at(0)?)
    }

    //==================================================================================DRIVER

    pub fn set_driver_init(&mut self) {
        self.start(ApiFunction::DriverInit, 0);
    }

    pub fn set_driver_release(&mut self) {
        self.start(ApiFunction::DriverRelease, 0);
    }

    pub fn set_process_id(&mut self, process_id: u32) {
        self.start(ApiFunction::ProcessId, 4);
        let written = self.frame.set_data_u32(0, process_id, ByteOrder::MsbFirst);
        debug_assert!(written);
    }

    pub fn process_id(&self) -> Option<u32> {
        if self.function() != ApiFunction::ProcessId {
            return None;
        }
        self.frame.data_u32(0, ByteOrder::MsbFirst)
    }

    //==================================================================================NAME

    /// Store an interface name, truncated to [`MAX_API_NAME_LEN`] bytes on a
    /// character boundary. Layout: length byte followed by UTF-8 bytes.
    pub fn set_name(&mut self, name: &str) {
        let mut len = name.len().min(MAX_API_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut payload = [0u8; MAX_API_NAME_LEN + 1];
        payload[0] = len as u8;
        payload[1..=len].copy_from_slice(&name.as_bytes()[..len]);

        self.start(ApiFunction::Name, 0);
        let written = self.frame.set_payload(&payload[..=len]);
        debug_assert!(written);
    }

    pub fn name(&self) -> Option<&str> {
        if self.function() != ApiFunction::Name {
            return None;
        }
        let len = self.frame.data_at(0)? as usize;
        let bytes = self.frame.data().get(1..=len)?;
        core::str::from_utf8(bytes).ok()
    }

    //==================================================================================TIMESTAMP

    pub fn timestamp(&self) -> Timestamp {
        self.frame.timestamp()
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.frame.set_timestamp(timestamp);
    }
}

impl fmt::Display for ApiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function() {
            ApiFunction::None => f.write_str("API none"),
            ApiFunction::Bitrate => match self.bitrate() {
                Some((nominal, data)) => write!(f, "API bitrate {:?}/{:?}", nominal, data),
                None => f.write_str("API bitrate ?"),
            },
            ApiFunction::CanMode => match self.mode() {
                Some(mode) => write!(f, "API mode {:?}", mode),
                None => f.write_str("API mode ?"),
            },
            ApiFunction::DriverInit => f.write_str("API driver init"),
            ApiFunction::DriverRelease => f.write_str("API driver release"),
            ApiFunction::ProcessId => write!(f, "API process {}", self.process_id().unwrap_or(0)),
            ApiFunction::Name => write!(f, "API name {}", self.name().unwrap_or("?")),
        }
    }
}
