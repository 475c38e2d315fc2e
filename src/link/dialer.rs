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

//! Outbound connect worker.

use std::sync::Arc;

use tracing::{debug, warn};

use super::events::Peer;
use super::manager::{LinkManager, WorkerKind};

/// Perform one outbound connect attempt to `peer`.
///
/// Success hands the channel to the manager; failure reports a lost
/// attempt, which the manager turns into a restart of listening mode.
/// An aborted attempt reports nothing: cancellation is expected and
/// must not be mistaken for a connect failure.
pub(crate) async fn run(mgr: Arc<LinkManager>, peer: Peer, slot: u64) {
    debug!("dialer started for {}", peer);

    match mgr.transport().dial(&peer).await {
        Ok(channel) => {
            mgr.established(channel, peer, WorkerKind::Dialer, slot);
        }
        Err(e) => {
            warn!("connect to {} failed: {e:#}", peer);
            mgr.connection_failed(slot);
        }
    }
}
