//! Minimal abstraction for the byte link under a socket (TCP stream,
//! WebSocket, shared memory, serial line). Allows the socket to plug into
//! any implementation without knowing how channels are addressed.
use crate::protocol::transport::CanChannel;
use futures_util::Future;

/// Contract to open a channel and move raw bytes asynchronously.
pub trait SocketLink {
    type Error: core::fmt::Debug;
    /// Connect to `channel`. Resolving the channel to an address is up to
    /// the implementation.
    fn open(&mut self, channel: CanChannel) -> impl Future<Output = Result<(), Self::Error>> + '_;
    /// Release the connection. Must be harmless when nothing is open.
    fn close(&mut self) -> impl Future<Output = ()> + '_;
    /// Write a complete encoded frame.
    fn send<'a>(&'a mut self, bytes: &'a [u8]) -> impl Future<Output = Result<(), Self::Error>> + 'a;
    /// Read the next chunk of bytes into `buffer` and return its length;
    /// `Ok(0)` means the peer closed the connection.
    ///
    /// The socket drops this future when another event wins, so it must not
    /// lose bytes when cancelled.
    fn recv<'a>(
        &'a mut self,
        buffer: &'a mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>> + 'a;
}
