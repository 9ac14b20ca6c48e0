/// Test doubles connecting a socket to an in-memory peer during integration tests.
use canlink::infra::codec::traits::ToByteArray;
use canlink::protocol::transport::traits::socket_link::SocketLink;
use canlink::protocol::transport::CanChannel;
use canlink::protocol::wire::assembler::{AssembleResult, WireAssembler};
use canlink::protocol::wire::WireFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

#[derive(Debug)]
#[allow(dead_code)]
pub enum MockLinkError {
    OpenRefused,
    PeerGone,
}

#[allow(dead_code)]
/// Socket side of an in-memory byte link.
pub struct MockLink {
    to_peer: mpsc::UnboundedSender<Vec<u8>>,
    from_peer: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: VecDeque<u8>,
    probe: LinkProbe,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Observation and fault injection shared with the link.
pub struct LinkProbe {
    opened: Arc<Mutex<Vec<u8>>>,
    closes: Arc<Mutex<usize>>,
    fail_open: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl LinkProbe {
    /// Channel numbers passed to every successful `open`.
    pub fn opened(&self) -> Vec<u8> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }
}

#[allow(dead_code)]
/// Host side: encodes frames for the socket and decodes what it sends.
pub struct MockPeer {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    assembler: WireAssembler,
    ready: VecDeque<WireFrame>,
}

#[allow(dead_code)]
/// Construct an interconnected link/peer pair plus the link probe.
pub fn create_pair() -> (MockLink, MockPeer, LinkProbe) {
    let (link_tx, peer_rx) = mpsc::unbounded_channel();
    let (peer_tx, link_rx) = mpsc::unbounded_channel();
    let probe = LinkProbe::default();

    let link = MockLink {
        to_peer: link_tx,
        from_peer: link_rx,
        pending: VecDeque::new(),
        probe: probe.clone(),
    };
    let peer = MockPeer {
        tx: Some(peer_tx),
        rx: peer_rx,
        assembler: WireAssembler::new(),
        ready: VecDeque::new(),
    };
    (link, peer, probe)
}

impl SocketLink for MockLink {
    type Error = MockLinkError;

    async fn open(&mut self, channel: CanChannel) -> Result<(), Self::Error> {
        if self.probe.fail_open.load(Ordering::SeqCst) {
            return Err(MockLinkError::OpenRefused);
        }
        self.probe.opened.lock().unwrap().push(channel.number());
        Ok(())
    }

    async fn close(&mut self) {
        *self.probe.closes.lock().unwrap() += 1;
        self.pending.clear();
    }

    async fn send<'a>(&'a mut self, bytes: &'a [u8]) -> Result<(), Self::Error> {
        self.to_peer
            .send(bytes.to_vec())
            .map_err(|_| MockLinkError::PeerGone)
    }

    async fn recv<'a>(&'a mut self, buffer: &'a mut [u8]) -> Result<usize, Self::Error> {
        if self.pending.is_empty() {
            match self.from_peer.recv().await {
                Some(chunk) => self.pending.extend(chunk),
                None => return Ok(0),
            }
        }
        let len = buffer.len().min(self.pending.len());
        for (slot, byte) in buffer.iter_mut().zip(self.pending.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

#[allow(dead_code)]
impl MockPeer {
    /// Send each frame as its own chunk.
    pub fn send(&self, frame: impl Into<WireFrame>) {
        let bytes = frame.into().to_wire_buffer().expect("frame must encode");
        self.send_raw(&bytes);
    }

    /// Send several frames concatenated into a single chunk.
    pub fn send_batch(&self, frames: &[WireFrame]) {
        let mut stream = Vec::new();
        for frame in frames {
            stream.extend_from_slice(&frame.to_wire_buffer().expect("frame must encode"));
        }
        self.send_raw(&stream);
    }

    pub fn send_raw(&self, bytes: &[u8]) {
        self.tx
            .as_ref()
            .expect("peer already closed")
            .send(bytes.to_vec())
            .expect("link side dropped");
    }

    /// Drop the sending half; the socket sees the peer closing the connection.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Next frame sent by the socket.
    pub async fn recv(&mut self) -> WireFrame {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return frame;
            }
            let chunk = within(self.rx.recv()).await.expect("link side dropped");
            let ready = &mut self.ready;
            self.assembler.process_slice(&chunk, |result| match result {
                AssembleResult::Complete(frame) => ready.push_back(frame),
                other => panic!("socket sent malformed bytes: {:?}", other),
            });
        }
    }

    /// `true` when nothing was sent within a short grace period.
    pub async fn is_silent(&mut self) -> bool {
        self.ready.is_empty()
            && timeout(Duration::from_millis(50), self.rx.recv())
                .await
                .is_err()
    }
}

#[allow(dead_code)]
/// Bound every wait so a broken state machine fails the test instead of hanging it.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    timeout(Duration::from_secs(2), future)
        .await
        .expect("operation timed out")
}
