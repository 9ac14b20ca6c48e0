//! Error frames: bus state and error counters reported by an interface.
//!
//! Payload layout: byte 0 CAN state, byte 1 error type, byte 2 receive
//! error counter, byte 3 transmit error counter.
use core::fmt;

use crate::core::{CanState, ErrorType, FrameFormat};
use crate::protocol::frame::{CanFrame, Timestamp};

const STATE_POS: usize = 0;
const TYPE_POS: usize = 1;
const RCV_COUNTER_POS: usize = 2;
const TRM_COUNTER_POS: usize = 3;
const ERROR_PAYLOAD_LEN: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Bus fault report, routed out of band (never filtered).
pub struct ErrorFrame {
    frame: CanFrame,
}

impl Default for ErrorFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorFrame {
    pub fn new() -> Self {
        let mut frame = CanFrame::new(FrameFormat::ClassicStandard, 0);
        frame.set_dlc(ERROR_PAYLOAD_LEN);
        Self { frame }
    }

    /// Wrap a decoded frame; needs the four status bytes with known codes.
    pub(crate) fn from_frame(frame: CanFrame) -> Option<Self> {
        if frame.data_size() < ERROR_PAYLOAD_LEN as usize {
            return None;
        }
        CanState::from_u8(frame.data_at(STATE_POS)?)?;
        ErrorType::from_u8(frame.data_at(TYPE_POS)?)?;
        Some(Self { frame })
    }

    pub fn as_frame(&self) -> &CanFrame {
        &self.frame
    }

    pub fn error_state(&self) -> CanState {
        self.byte(STATE_POS)
            .and_then(CanState::from_u8)
            .unwrap_or_default()
    }

    pub fn set_error_state(&mut self, state: CanState) {
        self.write(STATE_POS, state as u8);
    }

    pub fn error_type(&self) -> ErrorType {
        self.byte(TYPE_POS)
            .and_then(ErrorType::from_u8)
            .unwrap_or_default()
    }

    pub fn set_error_type(&mut self, error_type: ErrorType) {
        self.write(TYPE_POS, error_type as u8);
    }

    pub fn error_counter_receive(&self) -> u8 {
        self.byte(RCV_COUNTER_POS).unwrap_or(0)
    }

    pub fn set_error_counter_receive(&mut self, counter: u8) {
        self.write(RCV_COUNTER_POS, counter);
    }

    pub fn error_counter_transmit(&self) -> u8 {
        self.byte(TRM_COUNTER_POS).unwrap_or(0)
    }

    pub fn set_error_counter_transmit(&mut self, counter: u8) {
        self.write(TRM_COUNTER_POS, counter);
    }

    pub fn timestamp(&self) -> Timestamp {
        self.frame.timestamp()
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.frame.set_timestamp(timestamp);
    }

    /// Status bytes always exist since the DLC is fixed at construction.
    fn write(&mut self, pos: usize, value: u8) {
        let written = self.frame.set_data_at(pos, value);
        debug_assert!(written, "error frame byte {} out of payload", pos);
    }

    fn byte(&self, pos: usize) -> Option<u8> {
        self.frame.data_at(pos)
    }
}

impl fmt::Display for ErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ERROR {:?} {:?} rx={} tx={}",
            self.error_state(),
            self.error_type(),
            self.error_counter_receive(),
            self.error_counter_transmit()
        )
    }
}
