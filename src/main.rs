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

//! rflink bridge daemon.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rflink::config::Config;
use rflink::link::{LinkEvent, LinkManager, Peer, RfcommTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rflink=info".parse().unwrap()),
        )
        .init();

    info!("Starting rflink v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Bring up the adapter
    let transport = RfcommTransport::new(config.bluetooth.channel).await?;
    transport.set_name(&config.bluetooth.device_name).await?;

    // Wire the link manager
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let link = LinkManager::new(Arc::new(transport), event_tx);

    link.start();

    if let Some(addr) = &config.bluetooth.auto_connect {
        let address = addr
            .parse()
            .with_context(|| format!("invalid auto_connect address '{addr}'"))?;
        link.connect(Peer::new(address, None));
    }

    info!("Ready.");

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => match event {
                LinkEvent::StateChanged(state) => {
                    info!("Link state: {}", state);
                }
                LinkEvent::PeerIdentified(peer) => {
                    info!("Device connected: {}", peer);
                }
                LinkEvent::DataReceived(block) => {
                    debug!("{} bytes received", block.len());
                }
                LinkEvent::Notice(msg) => {
                    warn!("{}", msg);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    link.stop();
    info!("rflink stopped");
    Ok(())
}
