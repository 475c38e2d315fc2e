//! Integration tests for the connection core, driven through a stub
//! transport with in-memory channels.

use anyhow::Result;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::{mpsc, oneshot};

use rflink::link::{
    BoxedChannel, Inbound, LinkEvent, LinkManager, LinkState, Peer, Transport,
};

fn peer(last: u8, name: &str) -> Peer {
    Peer::new(
        bluer::Address::new([0x00, 0x11, 0x22, 0x33, 0x44, last]),
        Some(name.to_string()),
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

fn stub_channel() -> (BoxedChannel, DuplexStream) {
    let (local, remote) = tokio::io::duplex(1024);
    (Box::new(local), remote)
}

/// Transport controlled by the test: inbound connections are injected
/// through a channel, dial attempts stay pending until resolved.
struct HarnessTransport {
    inbound: Mutex<Option<mpsc::UnboundedReceiver<(BoxedChannel, Peer)>>>,
    dials: Mutex<Vec<oneshot::Sender<Result<BoxedChannel>>>>,
}

struct ChannelInbound {
    rx: mpsc::UnboundedReceiver<(BoxedChannel, Peer)>,
}

impl Inbound for ChannelInbound {
    fn accept(&mut self) -> BoxFuture<'_, Result<(BoxedChannel, Peer)>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(pair) => Ok(pair),
                None => std::future::pending().await,
            }
        })
    }
}

struct PendingInbound;

impl Inbound for PendingInbound {
    fn accept(&mut self) -> BoxFuture<'_, Result<(BoxedChannel, Peer)>> {
        Box::pin(std::future::pending())
    }
}

impl Transport for HarnessTransport {
    fn listen(&self) -> BoxFuture<'_, Result<Box<dyn Inbound>>> {
        Box::pin(async move {
            match self.inbound.lock().take() {
                Some(rx) => Ok(Box::new(ChannelInbound { rx }) as Box<dyn Inbound>),
                None => Ok(Box::new(PendingInbound) as Box<dyn Inbound>),
            }
        })
    }

    fn dial(&self, _peer: &Peer) -> BoxFuture<'_, Result<BoxedChannel>> {
        let (tx, rx) = oneshot::channel();
        self.dials.lock().push(tx);
        Box::pin(async move { rx.await? })
    }
}

struct Harness {
    link: Arc<LinkManager>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    transport: Arc<HarnessTransport>,
    inbound_tx: mpsc::UnboundedSender<(BoxedChannel, Peer)>,
}

impl Harness {
    fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(HarnessTransport {
            inbound: Mutex::new(Some(inbound_rx)),
            dials: Mutex::new(Vec::new()),
        });
        let (event_tx, events) = mpsc::unbounded_channel();
        let link = LinkManager::new(transport.clone(), event_tx);
        Self {
            link,
            events,
            transport,
            inbound_tx,
        }
    }

    fn resolve_dial(&self, outcome: Result<BoxedChannel>) -> bool {
        let tx = self.transport.dials.lock().remove(0);
        tx.send(outcome).is_ok()
    }

    fn drain_events(&mut self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Listener that forwards every received block to an mpsc channel.
fn forwarding_listener() -> (Arc<dyn rflink::DataListener>, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = Arc::new(move |data: &[u8]| {
        let _ = tx.send(data.to_vec());
    });
    (listener, rx)
}

async fn collect_bytes(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>, count: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    while bytes.len() < count {
        let block = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for data")
            .expect("listener channel closed");
        bytes.extend(block);
    }
    bytes
}

#[tokio::test]
async fn test_inbound_accept_connects() {
    let mut harness = Harness::new();

    harness.link.start();
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Listening);

    let (channel, _remote) = stub_channel();
    harness
        .inbound_tx
        .send((channel, peer(0x01, "board")))
        .unwrap();
    settle().await;

    assert_eq!(harness.link.state(), LinkState::Connected);
    assert_eq!(
        harness.link.peer().map(|p| p.display_name()),
        Some("board".into())
    );

    let events = harness.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, LinkEvent::PeerIdentified(p) if p.display_name() == "board")));
}

#[tokio::test]
async fn test_inbound_wins_race_with_outbound() {
    let mut harness = Harness::new();

    harness.link.start();
    harness.link.connect(peer(0x02, "dialed"));
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Connecting);

    // The inbound accept reports first and wins.
    let (channel, _remote) = stub_channel();
    harness
        .inbound_tx
        .send((channel, peer(0x01, "accepted")))
        .unwrap();
    settle().await;

    assert_eq!(harness.link.state(), LinkState::Connected);
    assert_eq!(
        harness.link.peer().map(|p| p.display_name()),
        Some("accepted".into())
    );

    // The dialer was cancelled at promotion; its attempt can no longer
    // deliver a channel, let alone alter the connected peer.
    let (late, _late_remote) = stub_channel();
    assert!(!harness.resolve_dial(Ok(late)));
    settle().await;
    assert_eq!(
        harness.link.peer().map(|p| p.display_name()),
        Some("accepted".into())
    );
    let _ = harness.drain_events();
}

#[tokio::test]
async fn test_byte_order_preserved() {
    let mut harness = Harness::new();
    let (listener, mut blocks) = forwarding_listener();
    harness.link.add_listener(listener);

    harness.link.start();
    harness.link.connect(peer(0x03, "board"));
    settle().await;
    let (channel, mut remote) = stub_channel();
    assert!(harness.resolve_dial(Ok(channel)));
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Connected);

    remote.write_all(&[0x01, 0x02, 0x03]).await.unwrap();
    let received = collect_bytes(&mut blocks, 3).await;
    assert_eq!(received, vec![0x01, 0x02, 0x03]);

    // The same bytes are retrievable one at a time, in the same order.
    assert_eq!(harness.link.buffer().read(), Some(0x01));
    assert_eq!(harness.link.buffer().read(), Some(0x02));
    assert_eq!(harness.link.buffer().read(), Some(0x03));
    assert_eq!(harness.link.buffer().read(), None);
    let _ = harness.drain_events();
}

#[tokio::test]
async fn test_read_failure_restarts_listening_once() {
    let mut harness = Harness::new();

    harness.link.start();
    harness.link.connect(peer(0x04, "board"));
    settle().await;
    let (channel, remote) = stub_channel();
    assert!(harness.resolve_dial(Ok(channel)));
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Connected);
    let _ = harness.drain_events();

    // Remote goes away: the pump observes EOF.
    drop(remote);
    settle().await;

    assert_eq!(harness.link.state(), LinkState::Listening);
    let events = harness.drain_events();
    let restarts = events
        .iter()
        .filter(|e| matches!(e, LinkEvent::StateChanged(LinkState::Listening)))
        .count();
    assert_eq!(restarts, 1, "exactly one transition back to Listening");
    let notices = events
        .iter()
        .filter(|e| matches!(e, LinkEvent::Notice(_)))
        .count();
    assert_eq!(notices, 1, "exactly one lost-connection notice");
}

#[tokio::test]
async fn test_echo_round_trip() {
    let mut harness = Harness::new();
    let (listener, mut blocks) = forwarding_listener();
    harness.link.add_listener(listener);

    harness.link.start();
    harness.link.connect(peer(0x05, "echo"));
    settle().await;

    // Stub peer that accepts immediately and echoes everything back.
    let (channel, mut remote) = stub_channel();
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        loop {
            match remote.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if remote.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
    assert!(harness.resolve_dial(Ok(channel)));
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Connected);

    harness.link.send(b"PING");
    let received = collect_bytes(&mut blocks, 4).await;
    assert_eq!(received, b"PING".to_vec());
    let _ = harness.drain_events();
}

#[tokio::test]
async fn test_stop_closes_established_channel() {
    let mut harness = Harness::new();

    harness.link.start();
    harness.link.connect(peer(0x06, "board"));
    settle().await;
    let (channel, mut remote) = stub_channel();
    assert!(harness.resolve_dial(Ok(channel)));
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Connected);

    harness.link.stop();
    settle().await;
    assert_eq!(harness.link.state(), LinkState::Idle);

    // Aborting the pump drops its channel; the remote observes EOF.
    let mut buf = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(2), remote.read(&mut buf))
        .await
        .expect("timed out waiting for close")
        .unwrap();
    assert_eq!(n, 0);
    let _ = harness.drain_events();
}
