// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Connection state machine owning the link workers.
//!
//! The manager holds the current [`LinkState`] plus one slot per worker
//! kind (acceptor, dialer, pump) behind a single mutex. Public
//! operations take the lock only for their state-mutating portion;
//! socket I/O happens inside the worker tasks, so a blocked radio
//! operation never stalls `stop()` or `connect()`.
//!
//! Workers are cancelled by aborting their task, which drops the socket
//! they own at the next await point. Each worker captures the slot id
//! it was started under; callbacks from a superseded slot are ignored,
//! so a cancelled worker can never mutate state for a newer session.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::buffer::ByteQueue;
use super::events::{LinkEvent, LinkState, Peer};
use super::registry::{DataListener, ListenerId, ListenerRegistry};
use super::transport::{BoxedChannel, Transport};
use super::{acceptor, dialer, pump};

/// Which worker reported an established channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerKind {
    Acceptor,
    Dialer,
}

struct Worker {
    slot: u64,
    task: JoinHandle<()>,
}

impl Worker {
    fn abort(self) {
        self.task.abort();
    }
}

struct Pump {
    slot: u64,
    task: JoinHandle<()>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl Pump {
    fn abort(self) {
        self.task.abort();
    }
}

struct Inner {
    state: LinkState,
    next_slot: u64,
    acceptor: Option<Worker>,
    dialer: Option<Worker>,
    pump: Option<Pump>,
    peer: Option<Peer>,
}

impl Inner {
    fn alloc_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }
}

/// Manages the single link to the remote device.
///
/// Construct one per process and hand it to whichever components need
/// it; events go out on the channel supplied at construction.
pub struct LinkManager {
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<LinkEvent>,
    buffer: ByteQueue,
    listeners: ListenerRegistry,
    inner: Mutex<Inner>,
}

impl LinkManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            events,
            buffer: ByteQueue::new(),
            listeners: ListenerRegistry::new(),
            inner: Mutex::new(Inner {
                state: LinkState::Idle,
                next_slot: 0,
                acceptor: None,
                dialer: None,
                pump: None,
                peer: None,
            }),
        })
    }

    /// Enter Listening mode. Cancels any connect attempt or established
    /// channel; keeps an already-running acceptor. Safe to call from
    /// every state.
    pub fn start(self: &Arc<Self>) {
        debug!("start");
        let mut inner = self.inner.lock();
        self.start_locked(&mut inner);
    }

    /// Open an outbound connection to `peer`. Cancels any prior connect
    /// attempt or established channel; the acceptor keeps running, and
    /// an inbound request racing this attempt is resolved at
    /// establishment time.
    pub fn connect(self: &Arc<Self>, peer: Peer) {
        info!("connect to: {}", peer);
        let mut inner = self.inner.lock();
        if let Some(w) = inner.dialer.take() {
            w.abort();
        }
        if let Some(p) = inner.pump.take() {
            p.abort();
        }
        inner.peer = None;

        let slot = inner.alloc_slot();
        let mgr = self.clone();
        let task = tokio::spawn(dialer::run(mgr, peer, slot));
        inner.dialer = Some(Worker { slot, task });
        self.set_state(&mut inner, LinkState::Connecting);
    }

    /// Cancel every worker and go Idle. A fresh `start()` is required
    /// to resume.
    pub fn stop(&self) {
        debug!("stop");
        let mut inner = self.inner.lock();
        if let Some(w) = inner.acceptor.take() {
            w.abort();
        }
        if let Some(w) = inner.dialer.take() {
            w.abort();
        }
        if let Some(p) = inner.pump.take() {
            p.abort();
        }
        inner.peer = None;
        self.set_state(&mut inner, LinkState::Idle);
    }

    /// Write a block to the established channel. A silent no-op unless
    /// Connected: a write attempted while disconnected is dropped, not
    /// queued.
    pub fn send(&self, data: &[u8]) {
        let inner = self.inner.lock();
        if inner.state != LinkState::Connected {
            debug!("send of {} bytes dropped, not connected", data.len());
            return;
        }
        if let Some(pump) = &inner.pump {
            let _ = pump.outbound.send(data.to_vec());
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LinkState {
        self.inner.lock().state
    }

    /// The remote device of the established channel, if any.
    pub fn peer(&self) -> Option<Peer> {
        self.inner.lock().peer.clone()
    }

    /// Register a consumer for received blocks.
    pub fn add_listener(&self, listener: Arc<dyn DataListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a consumer.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// The pollable buffer of received bytes.
    pub fn buffer(&self) -> &ByteQueue {
        &self.buffer
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// A worker established a channel. Whoever gets here first under
    /// the lock wins; a late or stale channel is closed by dropping it,
    /// never pumped.
    pub(crate) fn established(
        self: &Arc<Self>,
        channel: BoxedChannel,
        peer: Peer,
        kind: WorkerKind,
        slot: u64,
    ) {
        let mut inner = self.inner.lock();
        let current = match kind {
            WorkerKind::Acceptor => inner.acceptor.as_ref().map(|w| w.slot),
            WorkerKind::Dialer => inner.dialer.as_ref().map(|w| w.slot),
        };
        if current != Some(slot)
            || matches!(inner.state, LinkState::Idle | LinkState::Connected)
        {
            debug!("discarding channel from superseded {:?} worker", kind);
            drop(channel);
            return;
        }
        info!("connected to: {}", peer);

        if let Some(w) = inner.acceptor.take() {
            w.abort();
        }
        if let Some(w) = inner.dialer.take() {
            w.abort();
        }
        if let Some(p) = inner.pump.take() {
            p.abort();
        }

        let pump_slot = inner.alloc_slot();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let mgr = self.clone();
        let task = tokio::spawn(pump::run(mgr, channel, out_rx, pump_slot));
        inner.pump = Some(Pump {
            slot: pump_slot,
            task,
            outbound: out_tx,
        });
        inner.peer = Some(peer.clone());

        let _ = self.events.send(LinkEvent::PeerIdentified(peer));
        self.set_state(&mut inner, LinkState::Connected);
    }

    /// The dialer's connect attempt failed. Ignored when the dialer was
    /// already superseded: cancellation is not a failure and must not
    /// spin up a duplicate acceptor.
    pub(crate) fn connection_failed(self: &Arc<Self>, slot: u64) {
        let mut inner = self.inner.lock();
        if inner.dialer.as_ref().map(|w| w.slot) != Some(slot) {
            debug!("ignoring connect failure from superseded dialer");
            return;
        }
        inner.dialer = None;
        warn!("unable to connect device");
        let _ = self
            .events
            .send(LinkEvent::Notice("Unable to connect device".into()));
        self.start_locked(&mut inner);
    }

    /// The pump observed a read failure. Ignored when the pump was
    /// already superseded, so a failure path racing `stop()` or a newer
    /// session produces at most one transition.
    pub(crate) fn connection_lost(self: &Arc<Self>, slot: u64) {
        let mut inner = self.inner.lock();
        if inner.pump.as_ref().map(|p| p.slot) != Some(slot) {
            debug!("ignoring lost connection from superseded pump");
            return;
        }
        inner.pump = None;
        inner.peer = None;
        warn!("device connection was lost");
        let _ = self
            .events
            .send(LinkEvent::Notice("Device connection was lost".into()));
        self.start_locked(&mut inner);
    }

    /// Hand a received block to the buffer and every listener,
    /// preserving arrival order.
    pub(crate) fn deliver(&self, block: &[u8]) {
        self.buffer.push(block);
        self.listeners.notify(block);
        let _ = self.events.send(LinkEvent::DataReceived(block.to_vec()));
    }

    pub(crate) fn notice(&self, message: &str) {
        let _ = self.events.send(LinkEvent::Notice(message.to_string()));
    }

    fn start_locked(self: &Arc<Self>, inner: &mut Inner) {
        if let Some(w) = inner.dialer.take() {
            w.abort();
        }
        if let Some(p) = inner.pump.take() {
            p.abort();
        }
        inner.peer = None;

        if inner.acceptor.is_none() {
            let slot = inner.alloc_slot();
            let mgr = self.clone();
            let task = tokio::spawn(acceptor::run(mgr, slot));
            inner.acceptor = Some(Worker { slot, task });
        }
        self.set_state(inner, LinkState::Listening);
    }

    fn set_state(&self, inner: &mut Inner, state: LinkState) {
        if inner.state == state {
            return;
        }
        debug!("state {} -> {}", inner.state, state);
        inner.state = state;
        let _ = self.events.send(LinkEvent::StateChanged(state));
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(w) = inner.acceptor.take() {
            w.abort();
        }
        if let Some(w) = inner.dialer.take() {
            w.abort();
        }
        if let Some(p) = inner.pump.take() {
            p.abort();
        }
    }
}
