//! Data length code tables.
//!
//! Classic CAN: DLC 0..=8 is the byte count, larger codes clamp to 8.
//! CAN-FD: DLC 0..=8 is the byte count, 9..=15 map to 12, 16, 20, 24, 32, 48, 64.
use crate::core::FrameFormat;

/// Highest 4-bit data length code.
pub const MAX_DLC: u8 = 15;

/// Highest DLC meaningful for classic CAN.
pub const MAX_CLASSIC_DLC: u8 = 8;

const FD_SIZE_TABLE: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Clamp a DLC to the range allowed by `format`.
#[inline]
pub const fn clamp_dlc(format: FrameFormat, dlc: u8) -> u8 {
    let max = if format.is_fd() { MAX_DLC } else { MAX_CLASSIC_DLC };
    if dlc > max {
        max
    } else {
        dlc
    }
}

/// Byte count for a DLC. Out of range codes are clamped first.
#[inline]
pub const fn dlc_to_size(format: FrameFormat, dlc: u8) -> usize {
    FD_SIZE_TABLE[clamp_dlc(format, dlc) as usize] as usize
}

/// DLC encoding exactly `size` bytes, if one exists for `format`.
pub const fn size_to_dlc(format: FrameFormat, size: usize) -> Option<u8> {
    match dlc_for_len(format, size) {
        Some(dlc) if dlc_to_size(format, dlc) == size => Some(dlc),
        _ => None,
    }
}

/// Smallest DLC whose byte count holds `len` bytes.
pub const fn dlc_for_len(format: FrameFormat, len: usize) -> Option<u8> {
    if len > format.max_payload() {
        return None;
    }
    if len <= MAX_CLASSIC_DLC as usize {
        return Some(len as u8);
    }
    let mut dlc = MAX_CLASSIC_DLC + 1;
    while dlc <= MAX_DLC {
        if FD_SIZE_TABLE[dlc as usize] as usize >= len {
            return Some(dlc);
        }
        dlc += 1;
    }
    None
}
