use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::modules::cache::LikeStore;
use crate::modules::config::ReactionConfig;
use crate::modules::control::{ControlLookup, LikeControl};
use crate::modules::engine::{LikeEngine, ReactionState, ToggleOutcome, DEFAULT_HAPTIC_PULSE};
use crate::modules::events::{EventBus, FeedEvent};
use crate::modules::gesture::{Connectivity, GestureRecognizer, DOUBLE_TAP_WINDOW};
use crate::modules::listeners::{ListenerRegistry, TouchSurface};
use crate::modules::remote::ReactionApi;
use crate::modules::session::SessionProvider;

#[derive(Debug, Clone, Copy)]
pub struct FeedOptions {
    pub double_tap_window: Duration,
    pub haptic_pulse: Duration,
    pub online: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            double_tap_window: DOUBLE_TAP_WINDOW,
            haptic_pulse: DEFAULT_HAPTIC_PULSE,
            online: true,
        }
    }
}

impl From<&ReactionConfig> for FeedOptions {
    fn from(cfg: &ReactionConfig) -> Self {
        Self {
            double_tap_window: cfg.double_tap_window,
            haptic_pulse: cfg.haptic_pulse,
            online: true,
        }
    }
}

/// Reaction subsystem for one feed: owns the like cache, the listener
/// registry and the gesture timing state.
///
/// A toggle already in flight when its item's listener is removed still runs
/// to completion and updates the cache and the control.
pub struct Feed<A, S> {
    engine: Arc<LikeEngine<A, S>>,
    recognizer: Arc<GestureRecognizer<A, S>>,
    listeners: ListenerRegistry<A, S>,
    controls: Arc<dyn ControlLookup>,
    connectivity: Arc<Connectivity>,
}

impl<A: ReactionApi, S: LikeStore> Feed<A, S> {
    pub fn new(
        api: A,
        store: S,
        session: Arc<dyn SessionProvider>,
        controls: Arc<dyn ControlLookup>,
    ) -> Self {
        Self::with_options(api, store, session, controls, FeedOptions::default())
    }

    pub fn with_options(
        api: A,
        store: S,
        session: Arc<dyn SessionProvider>,
        controls: Arc<dyn ControlLookup>,
        options: FeedOptions,
    ) -> Self {
        let engine = Arc::new(
            LikeEngine::new(api, store, session, EventBus::new())
                .with_haptic_pulse(options.haptic_pulse),
        );
        let connectivity = Arc::new(Connectivity::new(options.online));
        let recognizer = Arc::new(
            GestureRecognizer::new(
                Arc::clone(&engine),
                Arc::clone(&controls),
                Arc::clone(&connectivity),
            )
            .with_window(options.double_tap_window),
        );
        let listeners = ListenerRegistry::new(Arc::clone(&recognizer));

        tracing::debug!(store = engine.store().name(), "feed reactions initialised");
        Self {
            engine,
            recognizer,
            listeners,
            controls,
            connectivity,
        }
    }

    pub fn engine(&self) -> &LikeEngine<A, S> {
        &self.engine
    }

    pub fn recognizer(&self) -> &GestureRecognizer<A, S> {
        &self.recognizer
    }

    pub fn listeners(&self) -> &ListenerRegistry<A, S> {
        &self.listeners
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.engine.events().subscribe()
    }

    pub fn set_online(&self, online: bool) {
        self.connectivity.set_online(online);
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn lookup_control(&self, item_id: &str) -> Option<Arc<dyn LikeControl>> {
        self.controls.lookup_control(item_id)
    }

    /// Click path.
    pub async fn toggle(&self, control: &dyn LikeControl) -> ToggleOutcome {
        self.engine.toggle(control).await
    }

    /// Click path for callers holding only the item id. `None` when the
    /// renderer has no control registered for it.
    pub async fn toggle_item(&self, item_id: &str) -> Option<ToggleOutcome> {
        let control = self.lookup_control(item_id)?;
        Some(self.engine.toggle(&*control).await)
    }

    pub fn reaction_state(&self, item_id: &str) -> Option<ReactionState> {
        self.lookup_control(item_id)
            .map(|c| self.engine.reaction_state(&*c))
    }

    pub fn add_listener(&self, item_id: &str) -> TouchSurface<A, S> {
        self.listeners.add_listener(item_id)
    }

    pub fn remove_listener(&self, item_id: &str) -> bool {
        self.listeners.remove_listener(item_id)
    }

    /// Session reset (e.g. admin impersonation ended): forgets every local
    /// like and cancels every touch listener.
    pub fn reset(&self) {
        self.engine.store().clear();
        self.listeners.clear();
        tracing::info!(store = self.engine.store().name(), "feed reactions reset");
    }
}
