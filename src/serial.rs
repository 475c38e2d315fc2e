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

//! Serial-port facade over the link.
//!
//! The surface a command protocol (Firmata or similar) consumes:
//! pollable buffered reads, a data-arrival signal, and write
//! passthrough to the link.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::link::{ByteQueue, DataListener, LinkManager, ListenerId};

/// Buffered serial view of the established channel.
///
/// Attach one to a [`LinkManager`]; received blocks accumulate in its
/// own FIFO until the protocol loop drains them. Writes go straight to
/// the link and follow its rules (dropped unless connected).
pub struct SerialPort {
    link: Arc<LinkManager>,
    queue: ByteQueue,
    data_ready: Notify,
    registration: Mutex<Option<ListenerId>>,
}

impl SerialPort {
    /// Create a port and register it for received data.
    pub fn attach(link: Arc<LinkManager>) -> Arc<Self> {
        let port = Arc::new(Self {
            link,
            queue: ByteQueue::new(),
            data_ready: Notify::new(),
            registration: Mutex::new(None),
        });
        let id = port.link.add_listener(port.clone());
        *port.registration.lock() = Some(id);
        port
    }

    /// Stop receiving data. Buffered bytes remain readable.
    pub fn detach(&self) {
        if let Some(id) = self.registration.lock().take() {
            self.link.remove_listener(id);
        }
    }

    /// Number of buffered bytes.
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest buffered byte.
    pub fn read(&self) -> Option<u8> {
        self.queue.read()
    }

    /// Pop the newest buffered byte.
    pub fn read_last(&self) -> Option<u8> {
        self.queue.read_last()
    }

    /// Take everything buffered so far, oldest first.
    pub fn drain(&self) -> Vec<u8> {
        self.queue.drain()
    }

    /// Discard the read buffer.
    pub fn clear(&self) {
        self.queue.clear();
    }

    /// Write a block to the link.
    pub fn write(&self, data: &[u8]) {
        self.link.send(data);
    }

    /// Wait until at least one byte is buffered.
    pub async fn readable(&self) {
        loop {
            if !self.queue.is_empty() {
                return;
            }
            self.data_ready.notified().await;
        }
    }
}

impl DataListener for SerialPort {
    fn on_data(&self, data: &[u8]) {
        self.queue.push(data);
        self.data_ready.notify_one();
    }
}
