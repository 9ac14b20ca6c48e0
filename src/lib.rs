//! `canlink` library: vendor-neutral CAN / CAN-FD stack for `no_std`
//! targets. The crate exposes the shared vocabulary and errors, the
//! bit-layout codec (infra), and the protocol layers: frame model, byte-array
//! wire protocol, identifier filter engine and socket transport.
#![no_std]
//==================================================================================
/// Frame formats, identifier masks and controller enumerations.
pub mod core;
/// Status vocabulary of transports and backends, plus the structural errors
/// of the filter engine and of the byte-array codec.
pub mod error;
/// Bit-layout codec: control byte, DLC tables, byte cursors.
pub mod infra;
/// Frame model, wire protocol, filtering and transport.
pub mod protocol;
//==================================================================================
