//! Shared vocabulary of the stack: frame formats, identifier masks, payload
//! limits and the controller enumerations (mode, state, error type, bitrate)
//! exchanged between the frame model, the wire protocol and driver backends.

//==================================================================================LIMITS

/// Largest payload carried by a CAN-FD frame.
pub const MAX_FD_PAYLOAD: usize = 64;

/// Largest payload carried by a classic CAN frame.
pub const MAX_CLASSIC_PAYLOAD: usize = 8;

/// Significant bits of an 11-bit standard identifier.
pub const STANDARD_ID_MASK: u32 = 0x0000_07FF;

/// Significant bits of a 29-bit extended identifier.
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

//==================================================================================FRAME_FORMAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame format: identifier width combined with the classic/FD distinction.
///
/// The discriminant doubles as the two low bits of the control byte
/// (bit 0 = extended identifier, bit 1 = FD format).
pub enum FrameFormat {
    /// Classic CAN, 11-bit identifier.
    #[default]
    ClassicStandard = 0,
    /// Classic CAN, 29-bit identifier.
    ClassicExtended = 1,
    /// CAN-FD, 11-bit identifier.
    FdStandard = 2,
    /// CAN-FD, 29-bit identifier.
    FdExtended = 3,
}

impl FrameFormat {
    /// Build a format from the identifier width and the FD switch.
    #[inline]
    pub const fn new(extended: bool, fd: bool) -> Self {
        match (extended, fd) {
            (false, false) => FrameFormat::ClassicStandard,
            (true, false) => FrameFormat::ClassicExtended,
            (false, true) => FrameFormat::FdStandard,
            (true, true) => FrameFormat::FdExtended,
        }
    }

    /// Decode the two format bits. Upper bits are ignored.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self::new(bits & 0x01 != 0, bits & 0x02 != 0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_extended(self) -> bool {
        matches!(self, FrameFormat::ClassicExtended | FrameFormat::FdExtended)
    }

    #[inline]
    pub const fn is_fd(self) -> bool {
        matches!(self, FrameFormat::FdStandard | FrameFormat::FdExtended)
    }

    /// Identifier mask matching the identifier width of this format.
    #[inline]
    pub const fn id_mask(self) -> u32 {
        if self.is_extended() {
            EXTENDED_ID_MASK
        } else {
            STANDARD_ID_MASK
        }
    }

    /// Largest payload a frame of this format can carry.
    #[inline]
    pub const fn max_payload(self) -> usize {
        if self.is_fd() {
            MAX_FD_PAYLOAD
        } else {
            MAX_CLASSIC_PAYLOAD
        }
    }

    /// Short label used by the human readable frame rendering.
    pub const fn label(self) -> &'static str {
        match self {
            FrameFormat::ClassicStandard => "CAN-STD",
            FrameFormat::ClassicExtended => "CAN-EXT",
            FrameFormat::FdStandard => "FD-STD",
            FrameFormat::FdExtended => "FD-EXT",
        }
    }
}

//==================================================================================CAN_MODE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Operating mode requested from a CAN controller.
pub enum CanMode {
    /// Controller stopped, configuration allowed.
    #[default]
    Init = 0,
    /// Normal operation: transmit and receive.
    Operation = 1,
    /// Receive only, no acknowledge and no transmission.
    ListenOnly = 2,
    /// Low power sleep.
    Sleep = 3,
    /// Internal loop-back self test.
    SelfTest = 4,
}

impl CanMode {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CanMode::Init),
            1 => Some(CanMode::Operation),
            2 => Some(CanMode::ListenOnly),
            3 => Some(CanMode::Sleep),
            4 => Some(CanMode::SelfTest),
            _ => None,
        }
    }
}

//==================================================================================CAN_STATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bus state reported by a controller, following the CAN fault confinement rules.
pub enum CanState {
    #[default]
    Stopped = 0,
    Sleeping = 1,
    /// Error active, both counters below 96.
    BusActive = 2,
    /// Warning level reached (counter above 96).
    BusWarning = 3,
    /// Error passive (counter above 127).
    BusPassive = 4,
    /// Transmit counter above 255, controller left the bus.
    BusOff = 5,
    /// Physical layer fault.
    PhyFault = 10,
    /// CAN_H line fault.
    PhyHigh = 11,
    /// CAN_L line fault.
    PhyLow = 12,
}

impl CanState {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CanState::Stopped),
            1 => Some(CanState::Sleeping),
            2 => Some(CanState::BusActive),
            3 => Some(CanState::BusWarning),
            4 => Some(CanState::BusPassive),
            5 => Some(CanState::BusOff),
            10 => Some(CanState::PhyFault),
            11 => Some(CanState::PhyHigh),
            12 => Some(CanState::PhyLow),
            _ => None,
        }
    }
}

//==================================================================================ERROR_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bus error observed by the controller.
pub enum ErrorType {
    #[default]
    None = 0,
    /// Recessive bit sent, dominant bit read back.
    Bit0 = 1,
    /// Dominant bit sent, recessive bit read back.
    Bit1 = 2,
    Stuff = 3,
    Form = 4,
    Crc = 5,
    Ack = 6,
}

impl ErrorType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ErrorType::None),
            1 => Some(ErrorType::Bit0),
            2 => Some(ErrorType::Bit1),
            3 => Some(ErrorType::Stuff),
            4 => Some(ErrorType::Form),
            5 => Some(ErrorType::Crc),
            6 => Some(ErrorType::Ack),
            _ => None,
        }
    }
}

//==================================================================================BITRATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Predefined bitrates. The discriminant is the index used on the wire;
/// `None` (-1) means "not configured" and is the usual data rate of classic CAN.
pub enum Bitrate {
    #[default]
    None = -1,
    Kbit10 = 0,
    Kbit20 = 1,
    Kbit50 = 2,
    Kbit100 = 3,
    Kbit125 = 4,
    Kbit250 = 5,
    Kbit500 = 6,
    Kbit800 = 7,
    Mbit1 = 8,
    /// Automatic bitrate detection.
    Auto = 9,
    Mbit2 = 10,
    Mbit4 = 11,
    Mbit5 = 12,
}

impl Bitrate {
    pub const fn from_index(index: i32) -> Option<Self> {
        match index {
            -1 => Some(Bitrate::None),
            0 => Some(Bitrate::Kbit10),
            1 => Some(Bitrate::Kbit20),
            2 => Some(Bitrate::Kbit50),
            3 => Some(Bitrate::Kbit100),
            4 => Some(Bitrate::Kbit125),
            5 => Some(Bitrate::Kbit250),
            6 => Some(Bitrate::Kbit500),
            7 => Some(Bitrate::Kbit800),
            8 => Some(Bitrate::Mbit1),
            9 => Some(Bitrate::Auto),
            10 => Some(Bitrate::Mbit2),
            11 => Some(Bitrate::Mbit4),
            12 => Some(Bitrate::Mbit5),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Bits per second, `None` for the unconfigured and automatic entries.
    pub const fn bits_per_second(self) -> Option<u32> {
        match self {
            Bitrate::None | Bitrate::Auto => None,
            Bitrate::Kbit10 => Some(10_000),
            Bitrate::Kbit20 => Some(20_000),
            Bitrate::Kbit50 => Some(50_000),
            Bitrate::Kbit100 => Some(100_000),
            Bitrate::Kbit125 => Some(125_000),
            Bitrate::Kbit250 => Some(250_000),
            Bitrate::Kbit500 => Some(500_000),
            Bitrate::Kbit800 => Some(800_000),
            Bitrate::Mbit1 => Some(1_000_000),
            Bitrate::Mbit2 => Some(2_000_000),
            Bitrate::Mbit4 => Some(4_000_000),
            Bitrate::Mbit5 => Some(5_000_000),
        }
    }

    /// Rates above 1 Mbit/s only exist for the FD data phase.
    #[inline]
    pub const fn is_data_phase_only(self) -> bool {
        matches!(self, Bitrate::Mbit2 | Bitrate::Mbit4 | Bitrate::Mbit5)
    }
}

//==================================================================================BYTE_ORDER
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Byte order for multi-byte payload accessors.
pub enum ByteOrder {
    /// Least significant byte first (Intel).
    #[default]
    LsbFirst,
    /// Most significant byte first (Motorola).
    MsbFirst,
}
