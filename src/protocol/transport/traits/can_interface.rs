//! Capability interface of a hardware (or virtual) CAN backend.
//!
//! Calls are synchronous and non-blocking: `read` reports an empty FIFO
//! instead of waiting, `write` reports a full FIFO instead of queuing.
//! Asynchronous conditions (bus off, error counters) surface through
//! [`CanInterface::state`] and error frames.
use crate::core::{Bitrate, CanMode, CanState};
use crate::error::CanResult;
use crate::protocol::frame::CanFrame;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame counters of an interface since connection.
pub struct InterfaceStatistics {
    pub frames_received: u32,
    pub frames_transmitted: u32,
    pub error_frames: u32,
}

/// Pluggable CAN backend.
pub trait CanInterface {
    /// Name under which the backend is registered.
    fn name(&self) -> &str;
    fn connect(&mut self) -> CanResult;
    fn disconnect(&mut self) -> CanResult;
    /// Nominal bitrate plus the FD data-phase bitrate (`Bitrate::None` for classic CAN).
    fn set_bitrate(&mut self, nominal: Bitrate, data: Bitrate) -> CanResult;
    fn set_mode(&mut self, mode: CanMode) -> CanResult;
    fn state(&self) -> CanState;
    fn statistics(&self) -> InterfaceStatistics;
    /// Next received frame, `Err(FifoReceiveEmpty)` when there is none.
    fn read(&mut self) -> CanResult<CanFrame>;
    fn write(&mut self, frame: &CanFrame) -> CanResult;
}
