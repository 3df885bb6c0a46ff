use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::modules::cache::LikeStore;
use crate::modules::control::ControlLookup;
use crate::modules::engine::{LikeEngine, ToggleOutcome};
use crate::modules::events::FeedEvent;
use crate::modules::remote::ReactionApi;

pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum TapOutcome {
    /// Listener was removed before this event was handled.
    Cancelled,
    Offline,
    SingleTap,
    /// Double tap on an item that is liked (or being liked by a previous double tap).
    AlreadyLiked,
    /// Double tap qualified but the renderer has no control for the item.
    NoControl,
    Toggled(ToggleOutcome),
}

/// Online flag maintained by the connectivity collaborator.
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TapState {
    last_tap: Option<Instant>,
    liked: bool,
}

/// `0 < now - prev < window`. A tap older than `prev` (clock skew, reordered
/// delivery) never qualifies.
pub fn is_double_tap(prev: Instant, now: Instant, window: Duration) -> bool {
    now.checked_duration_since(prev)
        .is_some_and(|interval| !interval.is_zero() && interval < window)
}

pub struct GestureRecognizer<A, S> {
    engine: Arc<LikeEngine<A, S>>,
    controls: Arc<dyn ControlLookup>,
    connectivity: Arc<Connectivity>,
    window: Duration,
    taps: Mutex<HashMap<String, TapState>>,
}

impl<A: ReactionApi, S: LikeStore> GestureRecognizer<A, S> {
    pub fn new(
        engine: Arc<LikeEngine<A, S>>,
        controls: Arc<dyn ControlLookup>,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            engine,
            controls,
            connectivity,
            window: DOUBLE_TAP_WINDOW,
            taps: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn on_touch_end(&self, item_id: &str) -> TapOutcome {
        self.on_touch_end_at(item_id, Instant::now()).await
    }

    pub async fn on_touch_end_at(&self, item_id: &str, now: Instant) -> TapOutcome {
        if !self.connectivity.is_online() {
            return TapOutcome::Offline;
        }

        let (double_tap, qualifies) = {
            let mut taps = self.lock_taps();
            let state = taps.entry(item_id.to_string()).or_default();
            let double_tap = state
                .last_tap
                .is_some_and(|prev| is_double_tap(prev, now, self.window));
            // Out-of-order delivery never moves the reference tap backwards.
            state.last_tap = Some(state.last_tap.map_or(now, |prev| prev.max(now)));

            let qualifies = double_tap && !state.liked && !self.engine.is_liked(item_id);
            if qualifies {
                state.liked = true;
            }
            (double_tap, qualifies)
        };

        if !double_tap {
            return TapOutcome::SingleTap;
        }
        if !qualifies {
            tracing::debug!(item_id, "double tap on liked item ignored");
            return TapOutcome::AlreadyLiked;
        }

        let _liked = LikedFlag {
            taps: &self.taps,
            item_id,
        };

        self.engine.events().emit(FeedEvent::TapAnimation {
            item_id: item_id.to_string(),
        });

        let Some(control) = self.controls.lookup_control(item_id) else {
            tracing::warn!(item_id, "double tap without a registered control");
            return TapOutcome::NoControl;
        };

        TapOutcome::Toggled(self.engine.like(&*control).await)
    }

    /// Drops timing state for an item that left the feed.
    pub fn forget(&self, item_id: &str) {
        self.lock_taps().remove(item_id);
    }

    pub fn clear(&self) {
        self.lock_taps().clear();
    }

    fn lock_taps(&self) -> MutexGuard<'_, HashMap<String, TapState>> {
        self.taps.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the transient per-surface liked flag once the triggered like settles.
struct LikedFlag<'a> {
    taps: &'a Mutex<HashMap<String, TapState>>,
    item_id: &'a str,
}

impl Drop for LikedFlag<'_> {
    fn drop(&mut self) {
        let mut taps = self.taps.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = taps.get_mut(self.item_id) {
            state.liked = false;
        }
    }
}
