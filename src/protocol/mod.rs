//! High-level components of the stack: the frame model, its byte-array wire
//! protocol, identifier filtering and the socket transport.
pub mod filter;
pub mod frame;
pub mod transport;
pub mod wire;
