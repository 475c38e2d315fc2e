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

//! Bluetooth RFCOMM link manager.
//!
//! Pairs this host with a single microcontroller over an RFCOMM/SPP
//! connection and relays the raw byte stream in both directions, so a
//! command protocol can run on top of it. The [`link`] module owns the
//! connection state machine; [`serial`] exposes the buffered serial
//! view a protocol layer consumes; [`discovery`] supplies peers to
//! dial.

pub mod config;
pub mod discovery;
pub mod link;
pub mod serial;

pub use link::{
    ByteQueue, DataListener, LinkEvent, LinkManager, LinkState, ListenerId, Peer, RfcommTransport,
};
pub use serial::SerialPort;
