//! Abstraction traits used by the transport layer (byte link, frame sender
//! extension and driver backends).
pub mod can_interface;
pub mod frame_sender;
pub mod socket_link;
