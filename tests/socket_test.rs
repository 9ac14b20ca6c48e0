mod helpers {
    include!("helpers/mod.rs");
}

use canlink::core::{CanState, ErrorType, FrameFormat};
use canlink::error::CanError;
use canlink::protocol::filter::{FilterList, FilterRule};
use canlink::protocol::frame::{ApiFrame, ApiFunction, CanFrame, ErrorFrame};
use canlink::protocol::transport::socket::{
    DefaultSocketResources, SocketEvent, SocketResources, SocketState,
};
use canlink::protocol::transport::CanChannel;
use canlink::protocol::wire::WireFrame;
use helpers::{create_pair, within};
use static_cell::StaticCell;

type Resources = DefaultSocketResources;

fn channel(number: u8) -> CanChannel {
    CanChannel::new(number).expect("valid channel")
}

fn data(format: FrameFormat, id: u32, payload: &[u8]) -> CanFrame {
    CanFrame::with_payload(format, id, payload).expect("payload fits")
}

static CONNECT_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn connect_reports_event_and_transmits_in_order() {
    let resources = CONNECT_RESOURCES.init(SocketResources::new());
    let (link, mut peer, probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            assert_eq!(socket.state(), SocketState::Disconnected);
            socket.connect_network(channel(3)).expect("connect request accepted");
            assert_eq!(socket.state(), SocketState::Connecting);

            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(3)));
            assert!(socket.is_connected());
            assert_eq!(probe.opened(), vec![3]);

            let frames = [
                data(FrameFormat::ClassicStandard, 0x100, &[1]),
                data(FrameFormat::FdExtended, 0x1ABC_DEF0, &[2; 24]),
                data(FrameFormat::ClassicExtended, 0x42, &[3, 4]),
            ];
            for frame in &frames {
                socket.write(frame).expect("queued");
            }
            for frame in frames {
                assert_eq!(peer.recv().await, WireFrame::Data(frame));
            }
            assert_eq!(socket.statistics().frames_transmitted, 3);
        } => {}
    }
}

static IDLE_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn operations_require_a_connection() {
    let resources = IDLE_RESOURCES.init(SocketResources::new());
    let (link, _peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            let frame = data(FrameFormat::ClassicStandard, 0x10, &[0]);
            assert_eq!(socket.write(&frame), Err(CanError::NotConnected));
            assert_eq!(socket.read(), Err(CanError::NotConnected));
            assert_eq!(socket.read_api().err(), Some(CanError::NotConnected));

            socket.connect_network(channel(1)).expect("first request accepted");
            assert_eq!(socket.connect_network(channel(2)), Err(CanError::GenericFailure));
            assert_eq!(socket.write(&frame), Err(CanError::NotConnected));

            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(1)));
            assert_eq!(socket.read(), Err(CanError::FifoReceiveEmpty));
            assert_eq!(socket.connect_network(channel(2)), Err(CanError::GenericFailure));
        } => {}
    }
}

static DISPATCH_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn inbound_frames_are_filtered_and_demultiplexed() {
    let resources = DISPATCH_RESOURCES.init(SocketResources::new());
    let (link, peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            let mut filters = FilterList::new();
            filters
                .append_filter(FilterRule::accept(FrameFormat::ClassicStandard, 0x100, 0x1FF).unwrap())
                .unwrap();
            socket.set_filter_list(filters);

            socket.connect_network(channel(2)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(2)));

            let accepted = data(FrameFormat::ClassicStandard, 0x150, &[0xAA, 0xBB]);
            let outside = data(FrameFormat::ClassicStandard, 0x300, &[0xCC]);
            let wrong_format = data(FrameFormat::ClassicExtended, 0x150, &[0xDD]);
            let mut api = ApiFrame::new();
            api.set_process_id(4242);
            let mut error = ErrorFrame::new();
            error.set_error_state(CanState::BusPassive);
            error.set_error_type(ErrorType::Stuff);
            error.set_error_counter_transmit(130);

            peer.send_batch(&[
                outside.into(),
                accepted.into(),
                wrong_format.into(),
                api.into(),
                error.into(),
            ]);

            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(3));
            assert_eq!(socket.read(), Ok(accepted));
            assert_eq!(socket.read(), Err(CanError::FifoReceiveEmpty));

            let received_api = socket.read_api().expect("API frame bypasses the filter");
            assert_eq!(received_api.function(), ApiFunction::ProcessId);
            assert_eq!(received_api.process_id(), Some(4242));

            let received_error = socket.read_error().expect("error frame bypasses the filter");
            assert_eq!(received_error.error_state(), CanState::BusPassive);
            assert_eq!(received_error.error_type(), ErrorType::Stuff);
            assert_eq!(received_error.error_counter_transmit(), 130);

            let stats = socket.statistics();
            assert_eq!(stats.frames_received, 1);
            assert_eq!(stats.error_frames, 1);
            assert_eq!(stats.frames_dropped, 0);

            socket.clear_filter_list();
            peer.send(outside);
            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            assert_eq!(socket.read(), Ok(outside));
        } => {}
    }
}

static DENY_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn installed_empty_filter_list_denies_data_frames() {
    let resources = DENY_RESOURCES.init(SocketResources::new());
    let (link, peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            socket.set_filter_list(FilterList::new());
            socket.connect_network(channel(1)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(1)));

            let mut api = ApiFrame::new();
            api.set_driver_init();
            peer.send_batch(&[data(FrameFormat::ClassicStandard, 0x10, &[1]).into(), api.into()]);

            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            assert_eq!(socket.read(), Err(CanError::FifoReceiveEmpty));
            assert_eq!(socket.read_api().map(|api| api.function()), Ok(ApiFunction::DriverInit));

            socket
                .append_filter(FilterRule::accept(FrameFormat::ClassicStandard, 0x10, 0x10).unwrap())
                .unwrap();
            let frame = data(FrameFormat::ClassicStandard, 0x10, &[2]);
            peer.send(frame);
            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            assert_eq!(socket.read(), Ok(frame));
        } => {}
    }
}

static STREAM_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn frames_split_across_chunks_are_reassembled() {
    let resources = STREAM_RESOURCES.init(SocketResources::new());
    let (link, peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            socket.connect_network(channel(5)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(5)));

            use canlink::infra::codec::traits::ToByteArray;
            let frame = data(FrameFormat::FdStandard, 0x7FF, &[9; 48]);
            let bytes = frame.to_wire_buffer().unwrap();
            let (head, tail) = bytes.split_at(10);

            peer.send_raw(&[0xEE, 0x00, 0x00]);
            peer.send_raw(head);
            assert!(socket.try_next_event().is_none());
            peer.send_raw(tail);

            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            assert_eq!(socket.read(), Ok(frame));
        } => {}
    }
}

static OVERRUN_RESOURCES: StaticCell<SocketResources<4, 2>> = StaticCell::new();

#[tokio::test]
async fn full_receive_queue_flags_overrun_on_next_frame() {
    let resources = OVERRUN_RESOURCES.init(SocketResources::new());
    let (link, peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            socket.connect_network(channel(1)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(1)));

            let frames: Vec<WireFrame> = (0..3)
                .map(|id| data(FrameFormat::ClassicStandard, 0x100 + id, &[id as u8]).into())
                .collect();
            peer.send_batch(&frames);

            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(2));
            assert_eq!(socket.statistics().frames_dropped, 1);
            let first = socket.read().unwrap();
            let second = socket.read().unwrap();
            assert_eq!((first.identifier(), first.is_overrun()), (0x100, false));
            assert_eq!((second.identifier(), second.is_overrun()), (0x101, false));

            peer.send(data(FrameFormat::ClassicStandard, 0x200, &[]));
            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            let flagged = socket.read().unwrap();
            assert_eq!(flagged.identifier(), 0x200);
            assert!(flagged.is_overrun());

            peer.send(data(FrameFormat::ClassicStandard, 0x201, &[]));
            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));
            assert!(!socket.read().unwrap().is_overrun());
        } => {}
    }
}

static API_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn api_frames_are_written_to_the_link() {
    let resources = API_RESOURCES.init(SocketResources::new());
    let (link, mut peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            let mut api = ApiFrame::new();
            api.set_name("bench-node");
            assert_eq!(socket.write_api(&api), Err(CanError::NotConnected));

            socket.connect_network(channel(4)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(4)));

            socket.write_api(&api).unwrap();
            match peer.recv().await {
                WireFrame::Api(sent) => assert_eq!(sent.name(), Some("bench-node")),
                other => panic!("expected an API frame, got {:?}", other),
            }
        } => {}
    }
}

static DISCONNECT_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn disconnect_closes_link_and_allows_reconnect() {
    let resources = DISCONNECT_RESOURCES.init(SocketResources::new());
    let (link, mut peer, probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            socket.disconnect_network();
            assert!(socket.try_next_event().is_none());

            socket.connect_network(channel(1)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(1)));

            socket.disconnect_network();
            socket.disconnect_network();
            assert_eq!(socket.state(), SocketState::Disconnected);
            assert_eq!(within(socket.next_event()).await, SocketEvent::Disconnected);
            assert_eq!(probe.closes(), 1);
            assert_eq!(
                socket.write(&data(FrameFormat::ClassicStandard, 0x1, &[])),
                Err(CanError::NotConnected)
            );

            socket.connect_network(channel(2)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(2)));
            assert_eq!(probe.opened(), vec![1, 2]);

            let frame = data(FrameFormat::ClassicStandard, 0x7, &[7]);
            socket.write(&frame).unwrap();
            assert_eq!(peer.recv().await, WireFrame::Data(frame));
            assert!(peer.is_silent().await);
        } => {}
    }
}

static PEER_CLOSE_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn peer_closing_the_link_disconnects_the_socket() {
    let resources = PEER_CLOSE_RESOURCES.init(SocketResources::new());
    let (link, mut peer, _probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            socket.connect_network(channel(6)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(6)));

            let frame = data(FrameFormat::ClassicStandard, 0x66, &[6]);
            peer.send(frame);
            assert_eq!(within(socket.next_event()).await, SocketEvent::FramesReceived(1));

            peer.close();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Disconnected);
            assert_eq!(socket.state(), SocketState::Disconnected);

            // Frames received before the loss stay readable.
            assert_eq!(socket.read(), Ok(frame));
            assert_eq!(socket.read(), Err(CanError::NotConnected));
        } => {}
    }
}

static FAILED_OPEN_RESOURCES: StaticCell<Resources> = StaticCell::new();

#[tokio::test]
async fn failed_open_reports_init_failure_without_retry() {
    let resources = FAILED_OPEN_RESOURCES.init(SocketResources::new());
    let (link, _peer, probe) = create_pair();
    let parts = resources.split(link);
    let socket = parts.socket;
    let runner = parts.runner.drive();
    tokio::pin!(runner);

    tokio::select! {
        never = &mut runner => match never {},
        _ = async {
            probe.fail_open(true);
            socket.connect_network(channel(8)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Error(CanError::InitFail));
            assert_eq!(socket.state(), SocketState::Disconnected);
            assert!(probe.opened().is_empty());

            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            assert!(socket.try_next_event().is_none());

            probe.fail_open(false);
            socket.connect_network(channel(8)).unwrap();
            assert_eq!(within(socket.next_event()).await, SocketEvent::Connected(channel(8)));
            assert_eq!(probe.opened(), vec![8]);
        } => {}
    }
}
