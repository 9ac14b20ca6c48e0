//! Infrastructure shared by the protocol layer: pure, allocation-free codecs.
pub mod codec;
