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

//! Radio transport abstraction and its RFCOMM implementation.
//!
//! The link manager talks to the radio through the [`Transport`] trait
//! so the connection core can be driven by stub transports in tests.

use anyhow::Result;
use bluer::rfcomm::{Listener, SocketAddr, Stream};
use bluer::{Address, Session};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;
use uuid::Uuid;

use super::events::Peer;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Service name announced for the serial link.
pub const SERVICE_NAME: &str = "rflink";

/// Default RFCOMM channel to use.
pub const RFCOMM_CHANNEL: u8 = 1;

/// An open bidirectional byte stream to the remote device.
///
/// Closed exactly once, by being dropped; both the failure path and the
/// cancellation path may release the same channel and dropping twice
/// cannot happen by construction.
pub trait Channel: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Channel for T {}

pub type BoxedChannel = Box<dyn Channel>;

/// A bound inbound endpoint, accepting connection requests one at a time.
pub trait Inbound: Send {
    fn accept(&mut self) -> BoxFuture<'_, Result<(BoxedChannel, Peer)>>;
}

/// Factory for the two ways a channel comes into existence: accepting
/// an inbound request or dialing out to a known peer.
pub trait Transport: Send + Sync {
    /// Bind the well-known service endpoint for inbound connections.
    fn listen(&self) -> BoxFuture<'_, Result<Box<dyn Inbound>>>;

    /// Open an outbound connection to `peer`.
    fn dial(&self, peer: &Peer) -> BoxFuture<'_, Result<BoxedChannel>>;
}

/// RFCOMM/SPP transport over BlueZ.
pub struct RfcommTransport {
    adapter: bluer::Adapter,
    channel: u8,
}

impl RfcommTransport {
    /// Create the transport on the default adapter, powering it on and
    /// making it discoverable.
    pub async fn new(channel: u8) -> Result<Self> {
        let session = Session::new().await?;
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        adapter.set_discoverable(true).await?;
        adapter.set_pairable(true).await?;

        Ok(Self { adapter, channel })
    }

    /// The underlying adapter, for discovery and naming.
    pub fn adapter(&self) -> &bluer::Adapter {
        &self.adapter
    }

    /// Get the adapter address.
    pub async fn address(&self) -> Result<Address> {
        Ok(self.adapter.address().await?)
    }

    /// Set the device name shown to remote devices.
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.adapter.set_alias(name.to_string()).await?;
        info!("Bluetooth name set to: {}", name);
        Ok(())
    }
}

impl Transport for RfcommTransport {
    fn listen(&self) -> BoxFuture<'_, Result<Box<dyn Inbound>>> {
        Box::pin(async move {
            let local_addr = SocketAddr::new(Address::any(), self.channel);
            let listener = Listener::bind(local_addr).await?;
            info!(
                "RFCOMM service '{}' listening on channel {} (UUID: {})",
                SERVICE_NAME, self.channel, SPP_UUID
            );
            Ok(Box::new(RfcommInbound { listener }) as Box<dyn Inbound>)
        })
    }

    fn dial(&self, peer: &Peer) -> BoxFuture<'_, Result<BoxedChannel>> {
        let remote_addr = SocketAddr::new(peer.address, self.channel);
        Box::pin(async move {
            let stream = Stream::connect(remote_addr).await?;
            Ok(Box::new(stream) as BoxedChannel)
        })
    }
}

struct RfcommInbound {
    listener: Listener,
}

impl Inbound for RfcommInbound {
    fn accept(&mut self) -> BoxFuture<'_, Result<(BoxedChannel, Peer)>> {
        Box::pin(async move {
            let (stream, remote_addr) = self.listener.accept().await?;
            let peer = Peer::new(remote_addr.addr, None);
            Ok((Box::new(stream) as BoxedChannel, peer))
        })
    }
}
