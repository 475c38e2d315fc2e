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

//! Bluetooth link module.
//!
//! Owns the single RFCOMM connection to the remote device: a state
//! machine over three cancellable workers (accept inbound, dial
//! outbound, pump the established channel) that relays a raw byte
//! stream in both directions.

mod acceptor;
mod buffer;
mod dialer;
mod events;
mod manager;
mod pump;
mod registry;
mod transport;

pub use buffer::ByteQueue;
pub use events::{LinkEvent, LinkState, Peer};
pub use manager::LinkManager;
pub use registry::{DataListener, ListenerId, ListenerRegistry};
pub use transport::{
    BoxedChannel, Channel, Inbound, RfcommTransport, Transport, RFCOMM_CHANNEL, SERVICE_NAME,
    SPP_UUID,
};
