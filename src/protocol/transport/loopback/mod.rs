//! In-process [`CanInterface`] that echoes every written frame into its
//! own receive FIFO. Useful for self tests and as a reference backend.
use heapless::Deque;

use crate::core::{Bitrate, CanMode, CanState};
use crate::error::{CanError, CanResult};
use crate::protocol::frame::CanFrame;
use crate::protocol::transport::traits::can_interface::{CanInterface, InterfaceStatistics};

/// Loopback backend with a receive FIFO of `N` frames.
pub struct LoopbackInterface<const N: usize> {
    name: &'static str,
    fifo: Deque<CanFrame, N>,
    nominal: Bitrate,
    data: Bitrate,
    mode: CanMode,
    connected: bool,
    stats: InterfaceStatistics,
}

impl<const N: usize> LoopbackInterface<N> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            fifo: Deque::new(),
            nominal: Bitrate::None,
            data: Bitrate::None,
            mode: CanMode::Init,
            connected: false,
            stats: InterfaceStatistics {
                frames_received: 0,
                frames_transmitted: 0,
                error_frames: 0,
            },
        }
    }

    pub fn bitrate(&self) -> (Bitrate, Bitrate) {
        (self.nominal, self.data)
    }

    pub fn mode(&self) -> CanMode {
        self.mode
    }

    /// Frames waiting in the receive FIFO.
    pub fn pending(&self) -> usize {
        self.fifo.len()
    }
}

impl<const N: usize> CanInterface for LoopbackInterface<N> {
    fn name(&self) -> &str {
        self.name
    }

    /// Requires a nominal bitrate; the controller enters operation mode.
    fn connect(&mut self) -> CanResult {
        if self.nominal == Bitrate::None {
            return Err(CanError::InitMissing);
        }
        self.connected = true;
        self.mode = CanMode::Operation;
        self.stats = InterfaceStatistics::default();
        Ok(())
    }

    fn disconnect(&mut self) -> CanResult {
        self.connected = false;
        self.mode = CanMode::Init;
        self.fifo.clear();
        Ok(())
    }

    fn set_bitrate(&mut self, nominal: Bitrate, data: Bitrate) -> CanResult {
        if nominal.bits_per_second().is_none() || nominal.is_data_phase_only() {
            return Err(CanError::InvalidBitrate);
        }
        if data == Bitrate::Auto {
            return Err(CanError::InvalidBitrate);
        }
        if let (Some(nominal_bps), Some(data_bps)) = (nominal.bits_per_second(), data.bits_per_second()) {
            if data_bps < nominal_bps {
                return Err(CanError::InvalidBitrate);
            }
        }
        self.nominal = nominal;
        self.data = data;
        Ok(())
    }

    fn set_mode(&mut self, mode: CanMode) -> CanResult {
        if !self.connected && mode != CanMode::Init {
            return Err(CanError::InitMissing);
        }
        self.mode = mode;
        Ok(())
    }

    fn state(&self) -> CanState {
        match (self.connected, self.mode) {
            (false, _) | (true, CanMode::Init) => CanState::Stopped,
            (true, CanMode::Sleep) => CanState::Sleeping,
            (true, _) => CanState::BusActive,
        }
    }

    fn statistics(&self) -> InterfaceStatistics {
        self.stats
    }

    fn read(&mut self) -> CanResult<CanFrame> {
        if !self.connected {
            return Err(CanError::NotConnected);
        }
        let frame = self.fifo.pop_front().ok_or(CanError::FifoReceiveEmpty)?;
        self.stats.frames_received = self.stats.frames_received.wrapping_add(1);
        Ok(frame)
    }

    fn write(&mut self, frame: &CanFrame) -> CanResult {
        if !self.connected {
            return Err(CanError::NotConnected);
        }
        match self.mode {
            CanMode::Operation | CanMode::SelfTest => {}
            CanMode::Init | CanMode::Sleep => return Err(CanError::InitMissing),
            CanMode::ListenOnly => return Err(CanError::NotSupported),
        }
        if frame.is_fd() && self.data == Bitrate::None {
            return Err(CanError::NotSupported);
        }
        self.fifo
            .push_back(*frame)
            .map_err(|_| CanError::FifoTransmitFull)?;
        self.stats.frames_transmitted = self.stats.frames_transmitted.wrapping_add(1);
        Ok(())
    }
}
