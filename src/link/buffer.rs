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

//! Thread-safe FIFO of received bytes.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// FIFO of bytes received off the channel, drained by a parser loop.
///
/// The producer is the pump's read loop; the consumer is whatever
/// protocol layer sits on top. Unbounded: the link is slow relative to
/// any consumer.
#[derive(Debug, Default)]
pub struct ByteQueue {
    inner: Mutex<VecDeque<u8>>,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received block, preserving arrival order.
    pub fn push(&self, block: &[u8]) {
        self.inner.lock().extend(block.iter().copied());
    }

    /// Pop the oldest byte.
    pub fn read(&self) -> Option<u8> {
        self.inner.lock().pop_front()
    }

    /// Pop the newest byte.
    pub fn read_last(&self) -> Option<u8> {
        self.inner.lock().pop_back()
    }

    /// Take everything buffered so far, oldest first.
    pub fn drain(&self) -> Vec<u8> {
        self.inner.lock().drain(..).collect()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Discard everything buffered.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
