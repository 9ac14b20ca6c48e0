//! Transport layer: the socket that multiplexes data, API and error frames
//! over one byte link, the link and driver abstraction traits, the backend
//! registry and an in-process loopback backend.
//!
//! ## Sizing
//!
//! Data queue depths are const generics of
//! [`SocketResources`](socket::SocketResources). The constants below size the
//! remaining fixed buffers.

pub mod loopback;
pub mod registry;
pub mod socket;
pub mod traits;

/// Number of addressable CAN channels.
pub const CHANNEL_COUNT: u8 = 8;

/// First TCP port of the channel range; channel `n` listens on `base + n`.
///
/// Address resolution belongs to the [`SocketLink`](traits::socket_link::SocketLink)
/// implementation; this is only the conventional default.
pub const DEFAULT_TCP_PORT_BASE: u16 = 55660;

/// Depth of the API and error frame queues of a socket.
///
/// Administrative traffic is sparse. When the application does not drain
/// these queues, new administrative frames are dropped and counted.
pub const ADMIN_QUEUE_DEPTH: usize = 8;

/// Depth of the socket event queue (connected, disconnected, error, frames received).
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Maximum number of filter rules installed on a socket.
pub const SOCKET_FILTER_CAPACITY: usize = 16;

/// Size of the chunk buffer handed to [`SocketLink::recv`](traits::socket_link::SocketLink::recv).
///
/// Any size works since frames are reassembled across chunks; larger chunks
/// only reduce the number of link calls.
pub const LINK_BUFFER_SIZE: usize = 256;

/// Outbound queue depth of [`DefaultSocketResources`](socket::DefaultSocketResources).
pub const DEFAULT_TX_QUEUE_DEPTH: usize = 32;

/// Inbound data frame queue depth of [`DefaultSocketResources`](socket::DefaultSocketResources).
pub const DEFAULT_RX_QUEUE_DEPTH: usize = 64;

//==================================================================================CAN_CHANNEL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Numbered CAN channel, `1..=CHANNEL_COUNT`.
pub struct CanChannel(u8);

impl CanChannel {
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= CHANNEL_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Conventional TCP port for this channel, `None` past the port range.
    #[inline]
    pub const fn tcp_port(self, base: u16) -> Option<u16> {
        base.checked_add(self.0 as u16)
    }
}
