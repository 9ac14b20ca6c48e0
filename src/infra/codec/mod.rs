//! Bit-layout codec (control field, identifier masking, DLC tables),
//! byte cursors for the wire protocol and the byte-array traits.
pub mod bits;
pub mod bytes;
pub mod dlc;
pub mod traits;
