//! Bit layout of the frame control field.
//!
//! One byte carries the frame format together with the per-frame flags:
//!
//! | bit | meaning                              |
//! |-----|--------------------------------------|
//! | 0   | extended (29-bit) identifier         |
//! | 1   | FD format                            |
//! | 2   | remote frame (classic only)          |
//! | 3   | receive overrun                      |
//! | 4-5 | reserved, always zero                |
//! | 6   | bit-rate switch (FD only)            |
//! | 7   | error state indicator (FD only)      |
//!
//! The same byte is written verbatim by the wire protocol.
use crate::core::FrameFormat;

//==================================================================================CONTROL_BITS

pub const CTRL_EXTENDED: u8 = 0x01;
pub const CTRL_FD: u8 = 0x02;
pub const CTRL_REMOTE: u8 = 0x04;
pub const CTRL_OVERRUN: u8 = 0x08;
pub const CTRL_BIT_RATE_SWITCH: u8 = 0x40;
pub const CTRL_ERROR_STATE: u8 = 0x80;

/// Bits selecting the [`FrameFormat`].
pub const CTRL_FORMAT_MASK: u8 = CTRL_EXTENDED | CTRL_FD;
/// Bits that must stay clear.
pub const CTRL_RESERVED_MASK: u8 = 0x30;

//==================================================================================CONTROL_FIELD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Packed control field of a frame.
///
/// Flags that do not exist for the current format are kept clear: a FD
/// frame is never remote, a classic frame never carries BRS or ESI.
pub struct ControlField(u8);

impl ControlField {
    /// Control field of a fresh frame: format bits only.
    #[inline]
    pub const fn new(format: FrameFormat) -> Self {
        Self(format.bits())
    }

    /// Decode a raw byte, `None` when reserved bits are set or a flag
    /// contradicts the format.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & CTRL_RESERVED_MASK != 0 {
            return None;
        }
        let fd = bits & CTRL_FD != 0;
        if fd && bits & CTRL_REMOTE != 0 {
            return None;
        }
        if !fd && bits & (CTRL_BIT_RATE_SWITCH | CTRL_ERROR_STATE) != 0 {
            return None;
        }
        Some(Self(bits))
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn format(self) -> FrameFormat {
        FrameFormat::from_bits(self.0 & CTRL_FORMAT_MASK)
    }

    /// Replace the format bits and drop the flags the new format cannot carry.
    pub fn set_format(&mut self, format: FrameFormat) {
        self.0 = (self.0 & !CTRL_FORMAT_MASK) | format.bits();
        if format.is_fd() {
            self.0 &= !CTRL_REMOTE;
        } else {
            self.0 &= !(CTRL_BIT_RATE_SWITCH | CTRL_ERROR_STATE);
        }
    }

    #[inline]
    pub const fn is_extended(self) -> bool {
        self.0 & CTRL_EXTENDED != 0
    }

    #[inline]
    pub const fn is_fd(self) -> bool {
        self.0 & CTRL_FD != 0
    }

    #[inline]
    pub const fn is_remote(self) -> bool {
        self.0 & CTRL_REMOTE != 0
    }

    /// Returns `false` when the request is refused (remote FD frame).
    pub fn set_remote(&mut self, remote: bool) -> bool {
        if remote && self.is_fd() {
            return false;
        }
        self.set_flag(CTRL_REMOTE, remote);
        true
    }

    #[inline]
    pub const fn is_overrun(self) -> bool {
        self.0 & CTRL_OVERRUN != 0
    }

    pub fn set_overrun(&mut self, overrun: bool) {
        self.set_flag(CTRL_OVERRUN, overrun);
    }

    #[inline]
    pub const fn is_bit_rate_switch(self) -> bool {
        self.0 & CTRL_BIT_RATE_SWITCH != 0
    }

    /// Returns `false` when the request is refused (classic frame).
    pub fn set_bit_rate_switch(&mut self, brs: bool) -> bool {
        if brs && !self.is_fd() {
            return false;
        }
        self.set_flag(CTRL_BIT_RATE_SWITCH, brs);
        true
    }

    #[inline]
    pub const fn is_error_state(self) -> bool {
        self.0 & CTRL_ERROR_STATE != 0
    }

    /// Returns `false` when the request is refused (classic frame).
    pub fn set_error_state(&mut self, esi: bool) -> bool {
        if esi && !self.is_fd() {
            return false;
        }
        self.set_flag(CTRL_ERROR_STATE, esi);
        true
    }

    /// Clear every flag, keep the format.
    #[inline]
    pub fn clear_flags(&mut self) {
        self.0 &= CTRL_FORMAT_MASK;
    }

    #[inline]
    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

//==================================================================================IDENTIFIER

/// Truncate an identifier to the width of `format`.
#[inline]
pub const fn mask_identifier(format: FrameFormat, identifier: u32) -> u32 {
    identifier & format.id_mask()
}
