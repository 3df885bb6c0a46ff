use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::modules::cache::LikeStore;
use crate::modules::gesture::{GestureRecognizer, TapOutcome};
use crate::modules::remote::ReactionApi;

/// Stops delivery of one touch subscription. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Touch-end subscription for one item surface, handed to the renderer.
pub struct TouchSurface<A, S> {
    item_id: String,
    cancel: CancelHandle,
    recognizer: Arc<GestureRecognizer<A, S>>,
}

impl<A, S> Clone for TouchSurface<A, S> {
    fn clone(&self) -> Self {
        Self {
            item_id: self.item_id.clone(),
            cancel: self.cancel.clone(),
            recognizer: Arc::clone(&self.recognizer),
        }
    }
}

impl<A: ReactionApi, S: LikeStore> TouchSurface<A, S> {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub async fn touch_end(&self) -> TapOutcome {
        self.touch_end_at(Instant::now()).await
    }

    /// Events reaching a cancelled surface are delivered but ignored.
    pub async fn touch_end_at(&self, at: Instant) -> TapOutcome {
        if self.cancel.is_cancelled() {
            return TapOutcome::Cancelled;
        }
        self.recognizer.on_touch_end_at(&self.item_id, at).await
    }
}

/// At most one active touch subscription per item id.
pub struct ListenerRegistry<A, S> {
    recognizer: Arc<GestureRecognizer<A, S>>,
    handles: Mutex<HashMap<String, CancelHandle>>,
}

impl<A: ReactionApi, S: LikeStore> ListenerRegistry<A, S> {
    pub fn new(recognizer: Arc<GestureRecognizer<A, S>>) -> Self {
        Self {
            recognizer,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_listener(&self, item_id: &str) -> TouchSurface<A, S> {
        let cancel = CancelHandle::new();
        let prev = self
            .lock_handles()
            .insert(item_id.to_string(), cancel.clone());
        if let Some(prev) = prev {
            tracing::debug!(item_id, "replacing existing touch listener");
            prev.cancel();
            self.recognizer.forget(item_id);
        }

        TouchSurface {
            item_id: item_id.to_string(),
            cancel,
            recognizer: Arc::clone(&self.recognizer),
        }
    }

    /// Returns false when no listener was installed for `item_id`.
    pub fn remove_listener(&self, item_id: &str) -> bool {
        let Some(handle) = self.lock_handles().remove(item_id) else {
            return false;
        };
        handle.cancel();
        self.recognizer.forget(item_id);
        true
    }

    pub fn clear(&self) {
        let drained: Vec<CancelHandle> = self.lock_handles().drain().map(|(_, h)| h).collect();
        for handle in drained {
            handle.cancel();
        }
        self.recognizer.clear();
    }

    pub fn is_listening(&self, item_id: &str) -> bool {
        self.lock_handles().contains_key(item_id)
    }

    pub fn len(&self) -> usize {
        self.lock_handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_handles(&self) -> MutexGuard<'_, HashMap<String, CancelHandle>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}
