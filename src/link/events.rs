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

//! Link state and notifications emitted by the link manager.

use std::fmt;

use bluer::Address;

/// State of the link manager.
///
/// Exactly one value at any instant; all access goes through the
/// manager's lock. `Idle` is the only state reachable at construction
/// and after an explicit `stop()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No workers running.
    Idle,
    /// Accepting inbound connections.
    Listening,
    /// An outbound connect attempt is in flight.
    Connecting,
    /// A channel is established and being pumped.
    Connected,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Idle => "Idle",
            LinkState::Listening => "Listening",
            LinkState::Connecting => "Connecting...",
            LinkState::Connected => "Connected",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the remote device.
///
/// Supplied by whoever selected the device (see [`crate::discovery`])
/// and recorded for the duration of a connection attempt. The manager
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Bluetooth device address.
    pub address: Address,
    /// Display name, if known.
    pub name: Option<String>,
}

impl Peer {
    pub fn new(address: Address, name: Option<String>) -> Self {
        Self { address, name }
    }

    /// Display name, falling back to the address.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.address.to_string())
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Notifications emitted by the link manager.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The link state changed.
    StateChanged(LinkState),
    /// A block of bytes arrived on the established channel.
    DataReceived(Vec<u8>),
    /// The remote device for the established channel.
    PeerIdentified(Peer),
    /// Transient user-facing message (for a toast or log line, not
    /// business logic).
    Notice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_display() {
        let addr = Address::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let unnamed = Peer::new(addr, None);
        assert_eq!(unnamed.display_name(), addr.to_string());

        let named = Peer::new(addr, Some("duemilanove".into()));
        assert_eq!(named.display_name(), "duemilanove");
        assert_eq!(named.to_string(), format!("duemilanove ({addr})"));
    }
}
