//! Socket multiplexing data, API and error frames over one [`SocketLink`].
//!
//! The socket is split in two halves sharing a statically allocated
//! [`SocketResources`] block:
//!
//! * [`CanSocket`]: cloneable, synchronous handle used by the application
//!   (connect, disconnect, read, write, filters, statistics, events);
//! * [`SocketRunner`]: future owning the link, to be spawned once on the
//!   executor. It opens and closes the link, drains the outbound queue and
//!   demultiplexes received bytes.
//!
//! `connect_network` only records the request and wakes the runner; the
//! outcome arrives later as [`SocketEvent::Connected`] or
//! [`SocketEvent::Error`]. Nothing is retried automatically.
//!
//! No allocation is performed; queue depths are const generics and the
//! firmware decides where the resources live (`static`, `StaticCell`).

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    channel::Channel,
    signal::Signal,
};
use futures_util::{future::select, future::Either, pin_mut};

use crate::error::{CanError, CanResult, FilterError};
use crate::protocol::filter::{FilterList, FilterRule};
use crate::protocol::frame::{ApiFrame, CanFrame, ErrorFrame};
use crate::protocol::transport::traits::frame_sender::FrameSender;
use crate::protocol::transport::traits::socket_link::SocketLink;
use crate::protocol::transport::{
    CanChannel, ADMIN_QUEUE_DEPTH, DEFAULT_RX_QUEUE_DEPTH, DEFAULT_TX_QUEUE_DEPTH, EVENT_QUEUE_DEPTH,
    LINK_BUFFER_SIZE, SOCKET_FILTER_CAPACITY,
};
use crate::protocol::wire::assembler::{AssembleResult, WireAssembler};
use crate::protocol::wire::WireFrame;

/// Filter list installed on a socket.
pub type SocketFilterList = FilterList<SOCKET_FILTER_CAPACITY>;

//==================================================================================STATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Connection state of a socket.
pub enum SocketState {
    #[default]
    Disconnected,
    /// Connection requested, link not open yet.
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Out-of-band notifications of a socket.
pub enum SocketEvent {
    Connected(CanChannel),
    Disconnected,
    /// Connection or link failure; the socket is disconnected when it is reported.
    Error(CanError),
    /// Number of frames (data, API or error) made available by one link read.
    FramesReceived(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame counters of a socket.
pub struct SocketStatistics {
    /// Data frames accepted by the filter and queued for `read`.
    pub frames_received: u32,
    /// Frames (data and API) handed to the link.
    pub frames_transmitted: u32,
    /// Error frames received.
    pub error_frames: u32,
    /// Frames lost because a receive queue was full.
    pub frames_dropped: u32,
}

#[derive(Debug, Clone, Copy)]
struct Control {
    state: SocketState,
    /// Incremented on every connection request; stale work is recognised by it.
    session: u32,
    channel: Option<CanChannel>,
}

impl Control {
    const fn new() -> Self {
        Self {
            state: SocketState::Disconnected,
            session: 0,
            channel: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Outbound {
    session: u32,
    frame: WireFrame,
}

//==================================================================================RESOURCES
/// Socket sized with the default queue depths.
pub type DefaultSocketResources = SocketResources<DEFAULT_TX_QUEUE_DEPTH, DEFAULT_RX_QUEUE_DEPTH>;

/// Shared state of one socket. `TX` is the outbound queue depth, `RX` the
/// inbound data frame queue depth.
pub struct SocketResources<const TX: usize, const RX: usize> {
    control: Mutex<CriticalSectionRawMutex, Cell<Control>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    outbound: Channel<CriticalSectionRawMutex, Outbound, TX>,
    inbound: Channel<CriticalSectionRawMutex, CanFrame, RX>,
    api: Channel<CriticalSectionRawMutex, ApiFrame, ADMIN_QUEUE_DEPTH>,
    errors: Channel<CriticalSectionRawMutex, ErrorFrame, ADMIN_QUEUE_DEPTH>,
    events: Channel<CriticalSectionRawMutex, SocketEvent, EVENT_QUEUE_DEPTH>,
    filters: Mutex<CriticalSectionRawMutex, RefCell<Option<SocketFilterList>>>,
    stats: Mutex<CriticalSectionRawMutex, Cell<SocketStatistics>>,
}

impl<const TX: usize, const RX: usize> Default for SocketResources<TX, RX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const TX: usize, const RX: usize> SocketResources<TX, RX> {
    pub const fn new() -> Self {
        Self {
            control: Mutex::new(Cell::new(Control::new())),
            wake: Signal::new(),
            outbound: Channel::new(),
            inbound: Channel::new(),
            api: Channel::new(),
            errors: Channel::new(),
            events: Channel::new(),
            filters: Mutex::new(RefCell::new(None)),
            stats: Mutex::new(Cell::new(SocketStatistics {
                frames_received: 0,
                frames_transmitted: 0,
                error_frames: 0,
                frames_dropped: 0,
            })),
        }
    }

    /// Split into the application handle and the runner owning `link`.
    pub fn split<L: SocketLink>(&self, link: L) -> SocketParts<'_, L, TX, RX> {
        SocketParts {
            socket: CanSocket { res: self },
            runner: SocketRunner {
                res: self,
                link,
                assembler: WireAssembler::new(),
                link_open: false,
                open_session: 0,
                pending_overrun: false,
            },
        }
    }

    fn control(&self) -> Control {
        self.control.lock(|cell| cell.get())
    }

    fn update_control<R>(&self, f: impl FnOnce(&mut Control) -> R) -> R {
        self.control.lock(|cell| {
            let mut control = cell.get();
            let result = f(&mut control);
            cell.set(control);
            result
        })
    }

    fn update_stats(&self, f: impl FnOnce(&mut SocketStatistics)) {
        self.stats.lock(|cell| {
            let mut stats = cell.get();
            f(&mut stats);
            cell.set(stats);
        })
    }

    fn emit(&self, event: SocketEvent) {
        if self.events.try_send(event).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("socket event queue full, dropping {}", event);
        }
    }

    fn accepts(&self, frame: &CanFrame) -> bool {
        self.filters.lock(|filters| match &*filters.borrow() {
            Some(list) => list.filter(frame),
            None => true,
        })
    }

    fn discard_outbound(&self) {
        while self.outbound.try_receive().is_ok() {}
    }

    /// Route one decoded frame. Returns `true` when it was made available.
    fn dispatch(&self, frame: WireFrame, overrun: &mut bool) -> bool {
        match frame {
            WireFrame::Data(mut frame) => {
                if !self.accepts(&frame) {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("frame {:x} rejected by filter", frame.identifier());
                    return false;
                }
                if *overrun {
                    frame.set_overrun(true);
                }
                match self.inbound.try_send(frame) {
                    Ok(()) => {
                        *overrun = false;
                        self.update_stats(|s| s.frames_received = s.frames_received.wrapping_add(1));
                        true
                    }
                    Err(_) => {
                        *overrun = true;
                        self.update_stats(|s| s.frames_dropped = s.frames_dropped.wrapping_add(1));
                        #[cfg(feature = "defmt")]
                        defmt::warn!("receive queue full, frame dropped");
                        false
                    }
                }
            }
            WireFrame::Api(api) => {
                let queued = self.api.try_send(api).is_ok();
                if !queued {
                    self.update_stats(|s| s.frames_dropped = s.frames_dropped.wrapping_add(1));
                }
                queued
            }
            WireFrame::Error(error) => {
                self.update_stats(|s| s.error_frames = s.error_frames.wrapping_add(1));
                let queued = self.errors.try_send(error).is_ok();
                if !queued {
                    self.update_stats(|s| s.frames_dropped = s.frames_dropped.wrapping_add(1));
                }
                queued
            }
        }
    }
}

/// Bundle returned by [`SocketResources::split`].
pub struct SocketParts<'a, L: SocketLink, const TX: usize, const RX: usize> {
    pub socket: CanSocket<'a, TX, RX>,
    pub runner: SocketRunner<'a, L, TX, RX>,
}

//==================================================================================HANDLE
/// Application side of a socket.
pub struct CanSocket<'a, const TX: usize, const RX: usize> {
    res: &'a SocketResources<TX, RX>,
}

impl<const TX: usize, const RX: usize> Clone for CanSocket<'_, TX, RX> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<const TX: usize, const RX: usize> Copy for CanSocket<'_, TX, RX> {}

impl<'a, const TX: usize, const RX: usize> CanSocket<'a, TX, RX> {
    pub fn state(&self) -> SocketState {
        self.res.control().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SocketState::Connected
    }

    /// Channel requested by the last `connect_network`.
    pub fn channel(&self) -> Option<CanChannel> {
        self.res.control().channel
    }

    /// Request a connection to `channel`.
    ///
    /// Returns immediately; completion is reported by an event. Fails with
    /// `GenericFailure` unless the socket is disconnected.
    pub fn connect_network(&self, channel: CanChannel) -> CanResult {
        self.res.update_control(|control| {
            if control.state != SocketState::Disconnected {
                return Err(CanError::GenericFailure);
            }
            control.state = SocketState::Connecting;
            control.session = control.session.wrapping_add(1);
            control.channel = Some(channel);
            Ok(())
        })?;
        #[cfg(feature = "defmt")]
        defmt::info!("socket connecting to channel {}", channel.number());
        self.res.wake.signal(());
        Ok(())
    }

    /// Tear the connection down from any state and discard queued
    /// transmissions. Calling it while disconnected has no effect.
    pub fn disconnect_network(&self) {
        let was_active = self.res.update_control(|control| {
            let active = control.state != SocketState::Disconnected;
            control.state = SocketState::Disconnected;
            active
        });
        self.res.discard_outbound();
        if was_active {
            #[cfg(feature = "defmt")]
            defmt::info!("socket disconnect requested");
            self.res.wake.signal(());
        }
    }

    /// Queue a data frame for transmission.
    pub fn write(&self, frame: &CanFrame) -> CanResult {
        self.enqueue(WireFrame::Data(*frame))
    }

    /// Queue an API frame for transmission.
    pub fn write_api(&self, frame: &ApiFrame) -> CanResult {
        self.enqueue(WireFrame::Api(*frame))
    }

    fn enqueue(&self, frame: WireFrame) -> CanResult {
        let control = self.res.control();
        if control.state != SocketState::Connected {
            return Err(CanError::NotConnected);
        }
        self.res
            .outbound
            .try_send(Outbound {
                session: control.session,
                frame,
            })
            .map_err(|_| CanError::FifoTransmitFull)
    }

    /// Next received data frame that passed the filter.
    pub fn read(&self) -> CanResult<CanFrame> {
        let received = self.res.inbound.try_receive().ok();
        self.take(received)
    }

    pub fn read_api(&self) -> CanResult<ApiFrame> {
        let received = self.res.api.try_receive().ok();
        self.take(received)
    }

    pub fn read_error(&self) -> CanResult<ErrorFrame> {
        let received = self.res.errors.try_receive().ok();
        self.take(received)
    }

    /// Frames still queued are readable after a disconnect.
    fn take<T>(&self, received: Option<T>) -> CanResult<T> {
        match received {
            Some(frame) => Ok(frame),
            None if self.state() == SocketState::Disconnected => Err(CanError::NotConnected),
            None => Err(CanError::FifoReceiveEmpty),
        }
    }

    /// Wait for the next socket event.
    pub async fn next_event(&self) -> SocketEvent {
        self.res.events.receive().await
    }

    pub fn try_next_event(&self) -> Option<SocketEvent> {
        self.res.events.try_receive().ok()
    }

    pub fn statistics(&self) -> SocketStatistics {
        self.res.stats.lock(|cell| cell.get())
    }

    /// Install `list`; from now on data frames are filtered by it.
    pub fn set_filter_list(&self, list: SocketFilterList) {
        self.res
            .filters
            .lock(|filters| *filters.borrow_mut() = Some(list));
    }

    /// Remove the filter list; every data frame passes again.
    pub fn clear_filter_list(&self) {
        self.res.filters.lock(|filters| *filters.borrow_mut() = None);
    }

    /// Copy of the installed filter list.
    pub fn filter_list(&self) -> Option<SocketFilterList> {
        self.res.filters.lock(|filters| filters.borrow().clone())
    }

    /// Append a rule to the installed list, installing an empty list first if needed.
    pub fn append_filter(&self, rule: FilterRule) -> Result<usize, FilterError> {
        self.res.filters.lock(|filters| {
            filters
                .borrow_mut()
                .get_or_insert_with(SocketFilterList::new)
                .append_filter(rule)
        })
    }
}

//==================================================================================RUNNER
/// Drives the link of a socket; see [`SocketRunner::drive`].
pub struct SocketRunner<'a, L: SocketLink, const TX: usize, const RX: usize> {
    res: &'a SocketResources<TX, RX>,
    link: L,
    assembler: WireAssembler,
    link_open: bool,
    open_session: u32,
    pending_overrun: bool,
}

enum Step<E> {
    Wake,
    Transmit(Outbound),
    Received(Result<usize, E>),
}

impl<'a, L: SocketLink, const TX: usize, const RX: usize> SocketRunner<'a, L, TX, RX> {
    /// Run the socket forever.
    pub async fn drive(mut self) -> Infallible {
        let mut buffer = [0u8; LINK_BUFFER_SIZE];
        loop {
            self.reconcile().await;

            if !self.link_open {
                if self.res.control().state != SocketState::Connecting {
                    self.res.wake.wait().await;
                }
                continue;
            }

            let step = {
                let wake = self.res.wake.wait();
                let outbound = self.res.outbound.receive();
                let received = self.link.recv(&mut buffer);
                pin_mut!(wake, outbound, received);

                match select(wake, select(outbound, received)).await {
                    Either::Left(_) => Step::Wake,
                    Either::Right((Either::Left((item, _)), _)) => Step::Transmit(item),
                    Either::Right((Either::Right((result, _)), _)) => Step::Received(result),
                }
            };

            match step {
                Step::Wake => {}
                Step::Transmit(item) => self.transmit(item).await,
                Step::Received(Ok(0)) => {
                    #[cfg(feature = "defmt")]
                    defmt::info!("peer closed the link");
                    self.link_lost(None).await;
                }
                Step::Received(Ok(len)) => self.on_received(&buffer[..len]),
                Step::Received(Err(_err)) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("link receive failed");
                    self.link_lost(Some(CanError::GenericFailure)).await;
                }
            }
        }
    }

    /// Bring the link in line with the requested state.
    async fn reconcile(&mut self) {
        let control = self.res.control();

        if self.link_open
            && (control.state == SocketState::Disconnected || control.session != self.open_session)
        {
            self.close_link().await;
            self.res.emit(SocketEvent::Disconnected);
        }

        if self.link_open || control.state != SocketState::Connecting {
            return;
        }
        let Some(channel) = control.channel else {
            self.res
                .update_control(|c| c.state = SocketState::Disconnected);
            return;
        };

        let session = control.session;
        match self.link.open(channel).await {
            Ok(()) => {
                let committed = self.res.update_control(|c| {
                    let current = c.session == session && c.state == SocketState::Connecting;
                    if current {
                        c.state = SocketState::Connected;
                    }
                    current
                });
                if committed {
                    self.link_open = true;
                    self.open_session = session;
                    self.pending_overrun = false;
                    self.assembler.reset();
                    #[cfg(feature = "defmt")]
                    defmt::info!("socket connected to channel {}", channel.number());
                    self.res.emit(SocketEvent::Connected(channel));
                } else {
                    // Request withdrawn while opening.
                    self.link.close().await;
                }
            }
            Err(_err) => {
                let current = self.res.update_control(|c| {
                    let current = c.session == session && c.state == SocketState::Connecting;
                    if current {
                        c.state = SocketState::Disconnected;
                    }
                    current
                });
                #[cfg(feature = "defmt")]
                defmt::warn!("opening channel {} failed", channel.number());
                if current {
                    self.res.emit(SocketEvent::Error(CanError::InitFail));
                }
            }
        }
    }

    async fn transmit(&mut self, item: Outbound) {
        let control = self.res.control();
        if control.state != SocketState::Connected || item.session != self.open_session {
            return;
        }
        match self.link.send_frame(&item.frame).await {
            Ok(()) => self
                .res
                .update_stats(|s| s.frames_transmitted = s.frames_transmitted.wrapping_add(1)),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("link send failed");
                self.link_lost(Some(CanError::GenericFailure)).await;
            }
        }
    }

    fn on_received(&mut self, bytes: &[u8]) {
        let res = self.res;
        let overrun = &mut self.pending_overrun;
        let mut delivered = 0usize;

        self.assembler.process_slice(bytes, |result| match result {
            AssembleResult::Complete(frame) => {
                if res.dispatch(frame, overrun) {
                    delivered += 1;
                }
            }
            AssembleResult::Discarded(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("discarding malformed frame: {}", _err);
            }
            AssembleResult::Pending => {}
        });

        if delivered > 0 {
            res.emit(SocketEvent::FramesReceived(delivered));
        }
    }

    /// The link failed underneath an open connection.
    async fn link_lost(&mut self, reason: Option<CanError>) {
        let session = self.open_session;
        self.close_link().await;
        self.res.update_control(|c| {
            if c.session == session && c.state == SocketState::Connected {
                c.state = SocketState::Disconnected;
            }
        });
        self.res.discard_outbound();
        if let Some(reason) = reason {
            self.res.emit(SocketEvent::Error(reason));
        }
        self.res.emit(SocketEvent::Disconnected);
    }

    async fn close_link(&mut self) {
        self.link.close().await;
        self.link_open = false;
        self.assembler.reset();
        #[cfg(feature = "defmt")]
        defmt::debug!("link closed");
    }
}
