//! Frame timestamp: seconds plus nanoseconds, each capped at a limit.
//! Arithmetic never wraps; overflow, underflow or an invalid operand
//! produce [`Timestamp::INVALID`].
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use embassy_time::Duration;

/// Largest representable seconds value.
pub const SECS_LIMIT: u32 = 4_290_000_000;
/// Largest nanoseconds value.
pub const NSEC_LIMIT: u32 = 999_999_999;
/// Value stored in both fields of an invalid timestamp.
pub const INVALID_VALUE: u32 = 0xFFFF_FFEE;

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Point in time attached to a frame. Ordered by seconds, then nanoseconds.
pub struct Timestamp {
    seconds: u32,
    nanoseconds: u32,
}

impl Timestamp {
    pub const ZERO: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Sentinel returned by failed arithmetic.
    pub const INVALID: Self = Self {
        seconds: INVALID_VALUE,
        nanoseconds: INVALID_VALUE,
    };

    /// Build a timestamp, clamping both parts to their limits.
    pub const fn new(seconds: u32, nanoseconds: u32) -> Self {
        Self {
            seconds: if seconds > SECS_LIMIT { SECS_LIMIT } else { seconds },
            nanoseconds: if nanoseconds > NSEC_LIMIT {
                NSEC_LIMIT
            } else {
                nanoseconds
            },
        }
    }

    /// Rebuild from stored fields: the invalid sentinel survives, anything
    /// else is clamped like [`Timestamp::new`].
    pub const fn from_raw(seconds: u32, nanoseconds: u32) -> Self {
        if seconds == INVALID_VALUE || nanoseconds == INVALID_VALUE {
            Self::INVALID
        } else {
            Self::new(seconds, nanoseconds)
        }
    }

    /// `INVALID` when the seconds part exceeds the limit.
    pub const fn from_micros(micros: u64) -> Self {
        Self::from_parts_checked(micros / 1_000_000, (micros % 1_000_000) as u32 * 1_000)
    }

    /// `INVALID` when the seconds part exceeds the limit.
    pub const fn from_millis(millis: u64) -> Self {
        Self::from_parts_checked(millis / 1_000, (millis % 1_000) as u32 * 1_000_000)
    }

    const fn from_parts_checked(seconds: u64, nanoseconds: u32) -> Self {
        if seconds > SECS_LIMIT as u64 {
            Self::INVALID
        } else {
            Self {
                seconds: seconds as u32,
                nanoseconds,
            }
        }
    }

    #[inline]
    pub const fn seconds(&self) -> u32 {
        self.seconds
    }

    #[inline]
    pub const fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Clamped to [`SECS_LIMIT`].
    pub fn set_seconds(&mut self, seconds: u32) {
        self.seconds = seconds.min(SECS_LIMIT);
    }

    /// Clamped to [`NSEC_LIMIT`].
    pub fn set_nanoseconds(&mut self, nanoseconds: u32) {
        self.nanoseconds = nanoseconds.min(NSEC_LIMIT);
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.seconds <= SECS_LIMIT && self.nanoseconds <= NSEC_LIMIT
    }

    pub fn clear(&mut self) {
        *self = Self::ZERO;
    }

    /// Total microseconds, `None` for an invalid timestamp.
    pub const fn as_micros(&self) -> Option<u64> {
        if !self.is_valid() {
            return None;
        }
        Some(self.seconds as u64 * 1_000_000 + (self.nanoseconds / 1_000) as u64)
    }

    /// Sum with carry from nanoseconds into seconds.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        if !self.is_valid() || !rhs.is_valid() {
            return None;
        }
        let mut seconds = self.seconds as u64 + rhs.seconds as u64;
        let mut nanoseconds = self.nanoseconds + rhs.nanoseconds;
        if nanoseconds >= NANOS_PER_SEC {
            nanoseconds -= NANOS_PER_SEC;
            seconds += 1;
        }
        if seconds > SECS_LIMIT as u64 {
            return None;
        }
        Some(Self {
            seconds: seconds as u32,
            nanoseconds,
        })
    }

    /// Difference with borrow, `None` when `rhs` is later than `self`.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        if !self.is_valid() || !rhs.is_valid() || self < rhs {
            return None;
        }
        let (seconds, nanoseconds) = if self.nanoseconds >= rhs.nanoseconds {
            (self.seconds - rhs.seconds, self.nanoseconds - rhs.nanoseconds)
        } else {
            (
                self.seconds - rhs.seconds - 1,
                self.nanoseconds + NANOS_PER_SEC - rhs.nanoseconds,
            )
        };
        Some(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Elapsed time as an [`embassy_time::Duration`] (microsecond resolution).
    pub fn to_duration(&self) -> Option<Duration> {
        self.as_micros().map(Duration::from_micros)
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Self::from_micros(duration.as_micros())
    }
}

impl Add for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).unwrap_or(Self::INVALID)
    }
}

impl AddAssign for Timestamp {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).unwrap_or(Self::INVALID)
    }
}

impl SubAssign for Timestamp {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
        } else {
            f.write_str("invalid")
        }
    }
}
