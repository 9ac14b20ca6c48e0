//! In-memory representation of one classic CAN or CAN-FD frame, plus the
//! administrative frame kinds (API and error frames) built on top of it.
//!
//! A [`CanFrame`] is a plain value: identifier, format, DLC, a 64-byte
//! payload store, flags, two opaque application tags and a timestamp.
//! Identifier and DLC are always normalised to the current format, and
//! payload bytes beyond [`CanFrame::data_size`] are always zero, so the
//! derived equality compares exactly what the frame carries.
use core::fmt;

use embedded_can::{ExtendedId, Id, StandardId};

use crate::core::{ByteOrder, FrameFormat, MAX_FD_PAYLOAD};
use crate::infra::codec::bits::{mask_identifier, ControlField};
use crate::infra::codec::dlc::{clamp_dlc, dlc_for_len, dlc_to_size, size_to_dlc};

pub mod api;
pub mod error_frame;
pub mod timestamp;

pub use api::{ApiFrame, ApiFunction};
pub use error_frame::ErrorFrame;
pub use timestamp::Timestamp;

//==================================================================================CAN_FRAME
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// CAN or CAN-FD data frame.
pub struct CanFrame {
    identifier: u32,
    ctrl: ControlField,
    dlc: u8,
    data: [u8; MAX_FD_PAYLOAD],
    marker: u32,
    user: u32,
    timestamp: Timestamp,
}

impl Default for CanFrame {
    fn default() -> Self {
        Self::new(FrameFormat::ClassicStandard, 0)
    }
}

impl CanFrame {
    /// Empty frame of `format`; the identifier is masked to the format width.
    pub const fn new(format: FrameFormat, identifier: u32) -> Self {
        Self {
            identifier: mask_identifier(format, identifier),
            ctrl: ControlField::new(format),
            dlc: 0,
            data: [0; MAX_FD_PAYLOAD],
            marker: 0,
            user: 0,
            timestamp: Timestamp::ZERO,
        }
    }

    /// Frame carrying `payload`. `None` when the payload does not fit the format.
    pub fn with_payload(format: FrameFormat, identifier: u32, payload: &[u8]) -> Option<Self> {
        let mut frame = Self::new(format, identifier);
        frame.set_payload(payload).then_some(frame)
    }

    /// Reassemble a frame from decoded fields. Callers validate `dlc` and
    /// `payload` against the format beforehand.
    pub(crate) fn from_parts(
        ctrl: ControlField,
        identifier: u32,
        dlc: u8,
        payload: &[u8],
        marker: u32,
        user: u32,
        timestamp: Timestamp,
    ) -> Self {
        let mut frame = Self::new(ctrl.format(), identifier);
        frame.ctrl = ctrl;
        frame.dlc = clamp_dlc(ctrl.format(), dlc);
        let len = payload.len().min(frame.data_size());
        if !ctrl.is_remote() {
            frame.data[..len].copy_from_slice(&payload[..len]);
        }
        frame.marker = marker;
        frame.user = user;
        frame.timestamp = timestamp;
        frame
    }

    //==================================================================================FORMAT_AND_ID

    #[inline]
    pub const fn format(&self) -> FrameFormat {
        self.ctrl.format()
    }

    /// Switch format. The identifier is re-masked, the DLC clamped and
    /// flags foreign to the new format dropped.
    pub fn set_format(&mut self, format: FrameFormat) {
        self.ctrl.set_format(format);
        self.identifier = mask_identifier(format, self.identifier);
        self.dlc = clamp_dlc(format, self.dlc);
        let size = self.data_size();
        self.data[size..].fill(0);
    }

    #[inline]
    pub const fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Out of range bits are truncated by the format mask.
    #[inline]
    pub fn set_identifier(&mut self, identifier: u32) {
        self.identifier = mask_identifier(self.format(), identifier);
    }

    #[inline]
    pub const fn is_extended(&self) -> bool {
        self.ctrl.is_extended()
    }

    #[inline]
    pub const fn is_fd(&self) -> bool {
        self.ctrl.is_fd()
    }

    //==================================================================================DLC_AND_DATA

    #[inline]
    pub const fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Set the data length code. Classic frames clamp to 8, FD frames to 15.
    /// Bytes dropped by a shorter length are zeroed.
    pub fn set_dlc(&mut self, dlc: u8) {
        let old_size = self.data_size();
        self.dlc = clamp_dlc(self.format(), dlc);
        let new_size = self.data_size();
        if new_size < old_size {
            self.data[new_size..old_size].fill(0);
        }
    }

    /// Payload byte count resolved from format and DLC.
    #[inline]
    pub const fn data_size(&self) -> usize {
        dlc_to_size(self.format(), self.dlc)
    }

    /// Significant payload bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_size()]
    }

    /// Byte at `pos`, `None` beyond the payload.
    #[inline]
    pub fn data_at(&self, pos: usize) -> Option<u8> {
        self.data().get(pos).copied()
    }

    /// Write one payload byte. Refused beyond the payload and on remote frames.
    pub fn set_data_at(&mut self, pos: usize, value: u8) -> bool {
        if self.is_remote() || pos >= self.data_size() {
            return false;
        }
        self.data[pos] = value;
        true
    }

    /// Replace the payload and pick the smallest DLC holding it; FD sizes
    /// between table entries are zero padded.
    pub fn set_payload(&mut self, payload: &[u8]) -> bool {
        if self.is_remote() {
            return false;
        }
        let Some(dlc) = dlc_for_len(self.format(), payload.len()) else {
            return false;
        };
        self.data = [0; MAX_FD_PAYLOAD];
        self.data[..payload.len()].copy_from_slice(payload);
        self.dlc = dlc;
        true
    }

    /// Set payload size in bytes; only exact table sizes are accepted.
    pub fn set_data_size(&mut self, size: usize) -> bool {
        match size_to_dlc(self.format(), size) {
            Some(dlc) => {
                self.set_dlc(dlc);
                true
            }
            None => false,
        }
    }

    pub fn data_u16(&self, pos: usize, order: ByteOrder) -> Option<u16> {
        let bytes = self.data().get(pos..pos.checked_add(2)?)?;
        let raw = [bytes[0], bytes[1]];
        Some(match order {
            ByteOrder::LsbFirst => u16::from_le_bytes(raw),
            ByteOrder::MsbFirst => u16::from_be_bytes(raw),
        })
    }

    pub fn data_u32(&self, pos: usize, order: ByteOrder) -> Option<u32> {
        let bytes = self.data().get(pos..pos.checked_add(4)?)?;
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Some(match order {
            ByteOrder::LsbFirst => u32::from_le_bytes(raw),
            ByteOrder::MsbFirst => u32::from_be_bytes(raw),
        })
    }

    pub fn set_data_u16(&mut self, pos: usize, value: u16, order: ByteOrder) -> bool {
        let raw = match order {
            ByteOrder::LsbFirst => value.to_le_bytes(),
            ByteOrder::MsbFirst => value.to_be_bytes(),
        };
        self.write_bytes(pos, &raw)
    }

    pub fn set_data_u32(&mut self, pos: usize, value: u32, order: ByteOrder) -> bool {
        let raw = match order {
            ByteOrder::LsbFirst => value.to_le_bytes(),
            ByteOrder::MsbFirst => value.to_be_bytes(),
        };
        self.write_bytes(pos, &raw)
    }

    fn write_bytes(&mut self, pos: usize, bytes: &[u8]) -> bool {
        let Some(end) = pos.checked_add(bytes.len()) else {
            return false;
        };
        if self.is_remote() || end > self.data_size() {
            return false;
        }
        self.data[pos..end].copy_from_slice(bytes);
        true
    }

    //==================================================================================FLAGS

    #[inline]
    pub const fn control(&self) -> ControlField {
        self.ctrl
    }

    #[inline]
    pub const fn is_remote(&self) -> bool {
        self.ctrl.is_remote()
    }

    /// Mark as remote request. The DLC is kept (expected response length)
    /// and the payload is zeroed. Refused for FD frames.
    pub fn set_remote(&mut self, remote: bool) -> bool {
        if !self.ctrl.set_remote(remote) {
            return false;
        }
        if remote {
            self.data = [0; MAX_FD_PAYLOAD];
        }
        true
    }

    #[inline]
    pub const fn is_overrun(&self) -> bool {
        self.ctrl.is_overrun()
    }

    pub fn set_overrun(&mut self, overrun: bool) {
        self.ctrl.set_overrun(overrun);
    }

    #[inline]
    pub const fn is_bit_rate_switch(&self) -> bool {
        self.ctrl.is_bit_rate_switch()
    }

    /// FD only.
    pub fn set_bit_rate_switch(&mut self, brs: bool) -> bool {
        self.ctrl.set_bit_rate_switch(brs)
    }

    #[inline]
    pub const fn is_error_state_indicator(&self) -> bool {
        self.ctrl.is_error_state()
    }

    /// FD only.
    pub fn set_error_state_indicator(&mut self, esi: bool) -> bool {
        self.ctrl.set_error_state(esi)
    }

    //==================================================================================TAGS

    #[inline]
    pub const fn marker(&self) -> u32 {
        self.marker
    }

    pub fn set_marker(&mut self, marker: u32) {
        self.marker = marker;
    }

    #[inline]
    pub const fn user(&self) -> u32 {
        self.user
    }

    pub fn set_user(&mut self, user: u32) {
        self.user = user;
    }

    #[inline]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Reset every field, keeping only the format.
    pub fn clear(&mut self) {
        *self = Self::new(self.format(), 0);
    }
}

//==================================================================================DISPLAY

impl fmt::Display for CanFrame {
    /// `CAN-STD 123 [2] 01 02`, `FD-EXT 18FF0001 [12] ... BRS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended() {
            write!(f, "{} {:08X} [{}]", self.format().label(), self.identifier, self.data_size())?;
        } else {
            write!(f, "{} {:03X} [{}]", self.format().label(), self.identifier, self.data_size())?;
        }
        if self.is_remote() {
            f.write_str(" RTR")?;
        } else {
            for byte in self.data() {
                write!(f, " {:02X}", byte)?;
            }
        }
        if self.is_bit_rate_switch() {
            f.write_str(" BRS")?;
        }
        if self.is_error_state_indicator() {
            f.write_str(" ESI")?;
        }
        if self.is_overrun() {
            f.write_str(" OVR")?;
        }
        Ok(())
    }
}

//==================================================================================EMBEDDED_CAN

impl embedded_can::Frame for CanFrame {
    /// Up to 8 bytes build a classic frame, larger FD table sizes an FD frame.
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let (extended, raw) = match id.into() {
            Id::Standard(id) => (false, id.as_raw() as u32),
            Id::Extended(id) => (true, id.as_raw()),
        };
        let format = FrameFormat::new(extended, data.len() > crate::core::MAX_CLASSIC_PAYLOAD);
        size_to_dlc(format, data.len())?;
        CanFrame::with_payload(format, raw, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > crate::core::MAX_CLASSIC_PAYLOAD {
            return None;
        }
        let mut frame = <CanFrame as embedded_can::Frame>::new(id, &[])?;
        frame.set_dlc(dlc as u8);
        frame.set_remote(true);
        Some(frame)
    }

    fn is_extended(&self) -> bool {
        CanFrame::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        self.is_remote()
    }

    fn id(&self) -> Id {
        if self.is_extended() {
            ExtendedId::new(self.identifier)
                .map(Id::Extended)
                .unwrap_or(Id::Extended(ExtendedId::ZERO))
        } else {
            StandardId::new(self.identifier as u16)
                .map(Id::Standard)
                .unwrap_or(Id::Standard(StandardId::ZERO))
        }
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        if self.is_remote() {
            &[]
        } else {
            CanFrame::data(self)
        }
    }
}
