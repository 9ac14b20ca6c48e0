//! `SocketLink` extension sending typed frames: encodes into a stack buffer
//! and writes the bytes in one call.
use crate::error::SendFrameError;
use crate::infra::codec::traits::ToByteArray;
use crate::protocol::transport::traits::socket_link::SocketLink;
use crate::protocol::wire::MAX_WIRE_LEN;

/// Implemented for every [`SocketLink`].
pub trait FrameSender: SocketLink {
    /// Encode `frame` and send it as one chunk.
    fn send_frame<'a, F: ToByteArray>(
        &'a mut self,
        frame: &'a F,
    ) -> impl core::future::Future<Output = Result<(), SendFrameError<Self::Error>>> + 'a;
}

impl<L: SocketLink> FrameSender for L {
    fn send_frame<'a, F: ToByteArray>(
        &'a mut self,
        frame: &'a F,
    ) -> impl core::future::Future<Output = Result<(), SendFrameError<Self::Error>>> + 'a {
        async move {
            let mut buffer = [0u8; MAX_WIRE_LEN];
            let len = frame
                .to_byte_array(&mut buffer)
                .map_err(SendFrameError::Serialization)?;
            self.send(&buffer[..len]).await.map_err(SendFrameError::Link)
        }
    }
}
