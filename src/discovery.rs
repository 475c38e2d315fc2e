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

//! Paired-device enumeration.
//!
//! Supplies [`Peer`] values for `LinkManager::connect`. Device
//! selection UI is out of scope; callers pick from this list or parse
//! an address directly.

use anyhow::Result;
use bluer::{Adapter, Address};

use crate::link::Peer;

/// Enumerate devices already paired with the adapter.
pub async fn paired_peers(adapter: &Adapter) -> Result<Vec<Peer>> {
    let mut peers = Vec::new();

    for addr in adapter.device_addresses().await? {
        let device = adapter.device(addr)?;
        if device.is_paired().await? {
            let name = device.alias().await.ok();
            peers.push(Peer::new(addr, name));
        }
    }

    Ok(peers)
}

/// Resolve a known address into a peer, picking up its display name if
/// the adapter knows the device.
pub async fn peer_by_address(adapter: &Adapter, address: Address) -> Result<Peer> {
    let device = adapter.device(address)?;
    let name = device.alias().await.ok();
    Ok(Peer::new(address, name))
}
