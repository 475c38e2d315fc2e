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

//! Established-channel worker.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::manager::LinkManager;
use super::transport::BoxedChannel;

/// Pump the established channel until it fails or the task is aborted.
///
/// Received blocks go to the byte buffer and the listeners in arrival
/// order. Queued outbound blocks are written to the channel; a write
/// failure is logged but does not tear the link down, because the
/// remote closing the link is observed as a read error. A read failure
/// reports the connection as lost exactly once, then the task ends and
/// the channel is dropped.
pub(crate) async fn run(
    mgr: Arc<LinkManager>,
    channel: BoxedChannel,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    slot: u64,
) {
    debug!("pump started");
    let (mut reader, mut writer) = tokio::io::split(channel);
    let mut buf = [0u8; 1024];

    loop {
        tokio::select! {
            res = reader.read(&mut buf) => match res {
                Ok(0) => {
                    info!("Connection closed by remote");
                    mgr.connection_lost(slot);
                    break;
                }
                Ok(n) => {
                    trace!("{} bytes received", n);
                    mgr.deliver(&buf[..n]);
                }
                Err(e) => {
                    warn!("read failed: {e}");
                    mgr.connection_lost(slot);
                    break;
                }
            },
            block = outbound.recv() => match block {
                Some(data) => {
                    if let Err(e) = writer.write_all(&data).await {
                        warn!("write of {} bytes failed: {e}", data.len());
                    } else {
                        trace!("{} bytes written", data.len());
                    }
                }
                // The manager dropped this pump's sender: the slot was
                // superseded and the task is about to be aborted.
                None => break,
            },
        }
    }
}
