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

//! Inbound accept worker.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::manager::{LinkManager, WorkerKind};

/// Delay before retrying after a bind or accept error.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Accept inbound connection requests until aborted.
///
/// Every accepted channel is handed to the manager, which decides
/// whether it becomes the established channel or gets closed. Bind and
/// accept errors are not fatal: the endpoint is re-bound after a short
/// delay so the device keeps accepting connections until told to stop.
pub(crate) async fn run(mgr: Arc<LinkManager>, slot: u64) {
    debug!("acceptor started");
    let mut reported = false;

    loop {
        let mut inbound = match mgr.transport().listen().await {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!("listen failed: {e:#}");
                if !reported {
                    mgr.notice("Unable to listen for connections");
                    reported = true;
                }
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };
        reported = false;
        info!("Waiting for connections...");

        loop {
            match inbound.accept().await {
                Ok((channel, remote)) => {
                    info!("Connection from: {}", remote);
                    mgr.established(channel, remote, WorkerKind::Acceptor, slot);
                }
                Err(e) => {
                    warn!("accept failed: {e:#}");
                    tokio::time::sleep(RETRY_DELAY).await;
                    break;
                }
            }
        }
    }
}
