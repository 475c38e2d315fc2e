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

//! Registry of consumers interested in received data.

use std::sync::Arc;

use parking_lot::Mutex;

/// A consumer of received byte blocks.
pub trait DataListener: Send + Sync {
    fn on_data(&self, data: &[u8]);
}

impl<F> DataListener for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn on_data(&self, data: &[u8]) {
        self(data)
    }
}

/// Handle identifying a registered listener, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Listeners notified on every received block.
///
/// Add and remove are safe against concurrent notification: `notify`
/// snapshots the listener set before iterating, so a removal during a
/// callback cannot fault, skip, or double-deliver to unaffected
/// listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Mutex<Entries>,
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    listeners: Vec<(u64, Arc<dyn DataListener>)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Callers are responsible for not registering
    /// the same consumer twice.
    pub fn add(&self, listener: Arc<dyn DataListener>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        ListenerId(id)
    }

    /// Remove a listener. Returns whether it was registered. A block
    /// already being delivered when this returns may still reach the
    /// listener; it receives nothing afterwards.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id.0);
        inner.listeners.len() != before
    }

    /// Deliver a block to every registered listener, in registration
    /// order.
    pub fn notify(&self, data: &[u8]) {
        let snapshot: Vec<Arc<dyn DataListener>> = {
            let inner = self.inner.lock();
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in snapshot {
            listener.on_data(data);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        blocks: Mutex<Vec<Vec<u8>>>,
    }

    impl DataListener for Recorder {
        fn on_data(&self, data: &[u8]) {
            self.blocks.lock().push(data.to_vec());
        }
    }

    #[test]
    fn test_notify_reaches_all_listeners() {
        let registry = ListenerRegistry::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        registry.add(a.clone());
        registry.add(b.clone());

        registry.notify(&[0x01, 0x02, 0x03]);

        assert_eq!(*a.blocks.lock(), vec![vec![0x01, 0x02, 0x03]]);
        assert_eq!(*b.blocks.lock(), vec![vec![0x01, 0x02, 0x03]]);
    }

    #[test]
    fn test_removed_listener_gets_nothing() {
        let registry = ListenerRegistry::new();
        let a = Arc::new(Recorder::default());
        let id = registry.add(a.clone());

        registry.notify(b"one");
        assert!(registry.remove(id));
        registry.notify(b"two");

        assert_eq!(*a.blocks.lock(), vec![b"one".to_vec()]);
        assert!(!registry.remove(id));
    }

    #[test]
    fn test_remove_from_own_callback() {
        struct SelfRemover {
            registry: Arc<ListenerRegistry>,
            id: Mutex<Option<ListenerId>>,
            seen: Mutex<usize>,
        }

        impl DataListener for SelfRemover {
            fn on_data(&self, _data: &[u8]) {
                *self.seen.lock() += 1;
                if let Some(id) = self.id.lock().take() {
                    self.registry.remove(id);
                }
            }
        }

        let registry = Arc::new(ListenerRegistry::new());
        let listener = Arc::new(SelfRemover {
            registry: registry.clone(),
            id: Mutex::new(None),
            seen: Mutex::new(0),
        });
        let id = registry.add(listener.clone());
        *listener.id.lock() = Some(id);

        // First delivery removes the listener from within its callback.
        registry.notify(b"first");
        // Next delivery must neither crash nor reach it.
        registry.notify(b"second");

        assert_eq!(*listener.seen.lock(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_closure_listener() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(Mutex::new(0usize));
        let c = count.clone();
        registry.add(Arc::new(move |data: &[u8]| {
            *c.lock() += data.len();
        }));

        registry.notify(&[1, 2, 3, 4]);
        assert_eq!(*count.lock(), 4);
    }
}
