use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::modules::cache::LikeStore;
use crate::modules::control::{HeartState, LikeControl};
use crate::modules::events::{EventBus, FeedEvent};
use crate::modules::remote::{ReactionApi, ReactionError};
use crate::modules::session::SessionProvider;

pub const DEFAULT_HAPTIC_PULSE: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum ToggleOutcome {
    /// Server confirmed the like.
    Liked { count: i64 },
    /// Server confirmed the unlike.
    Unliked { count: i64 },
    /// Server reported an existing like; local state forced to liked, count untouched.
    AlreadyLiked,
    /// Server answered without applying the change (unlike `status: false`, unexpected code).
    Rejected,
    /// Like-only request for an item that is already liked locally.
    Skipped,
    /// A toggle for the same item is still in flight; this trigger was dropped.
    Busy,
    Failed(ReactionError),
}

impl ToggleOutcome {
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            ToggleOutcome::Liked { .. } | ToggleOutcome::Unliked { .. } | ToggleOutcome::AlreadyLiked
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionState {
    pub item_id: String,
    pub liked_locally: bool,
    pub displayed_count: i64,
    pub pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Toggle,
    LikeOnly,
}

pub struct LikeEngine<A, S> {
    api: A,
    store: S,
    session: Arc<dyn SessionProvider>,
    events: EventBus,
    haptic_pulse: Duration,
    in_flight: Mutex<HashSet<String>>,
}

impl<A: ReactionApi, S: LikeStore> LikeEngine<A, S> {
    pub fn new(api: A, store: S, session: Arc<dyn SessionProvider>, events: EventBus) -> Self {
        Self {
            api,
            store,
            session,
            events,
            haptic_pulse: DEFAULT_HAPTIC_PULSE,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_haptic_pulse(mut self, pulse: Duration) -> Self {
        self.haptic_pulse = pulse;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_liked(&self, item_id: &str) -> bool {
        self.store.has(item_id)
    }

    pub fn is_pending(&self, item_id: &str) -> bool {
        lock(&self.in_flight).contains(item_id)
    }

    pub fn reaction_state(&self, control: &dyn LikeControl) -> ReactionState {
        let item_id = control.item_id();
        ReactionState {
            item_id: item_id.to_string(),
            liked_locally: self.store.has(item_id),
            displayed_count: control.count(),
            pending: self.is_pending(item_id),
        }
    }

    /// Likes the item behind `control` if the local cache says it is not
    /// liked, otherwise unlikes it.
    pub async fn toggle(&self, control: &dyn LikeControl) -> ToggleOutcome {
        self.run(control, Intent::Toggle).await
    }

    /// Like path only. Never unlikes.
    pub async fn like(&self, control: &dyn LikeControl) -> ToggleOutcome {
        self.run(control, Intent::LikeOnly).await
    }

    async fn run(&self, control: &dyn LikeControl, intent: Intent) -> ToggleOutcome {
        let item_id = control.item_id().to_string();
        if item_id.is_empty() {
            return ToggleOutcome::Failed(ReactionError::InvalidItemId(item_id));
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight, &item_id, control) else {
            tracing::debug!(item_id = %item_id, "toggle already in flight, trigger dropped");
            return ToggleOutcome::Busy;
        };

        let liked = self.store.has(&item_id);
        if liked && intent == Intent::LikeOnly {
            return ToggleOutcome::Skipped;
        }

        self.events.emit(FeedEvent::Haptic {
            item_id: item_id.clone(),
            pulse: self.haptic_pulse,
        });

        let token = self.session.token();
        let token = token.as_deref().map(String::as_str);

        if liked {
            self.unlike_remote(&item_id, control, token).await
        } else {
            self.like_remote(&item_id, control, token).await
        }
    }

    async fn unlike_remote(
        &self,
        item_id: &str,
        control: &dyn LikeControl,
        token: Option<&str>,
    ) -> ToggleOutcome {
        let current = control.count();
        match self.api.remove_reaction(item_id, token).await {
            Ok(res) if res.data.status => {
                let count = res
                    .data
                    .like_count
                    .unwrap_or_else(|| current.saturating_sub(1))
                    .max(0);
                // Other clients may still like it: the heart stays filled while count > 0.
                let heart = if count > 0 {
                    HeartState::Liked
                } else {
                    HeartState::Unliked
                };

                self.store.unset(item_id);
                control.set_heart(heart);
                control.set_count(count);

                tracing::debug!(item_id, count, "unliked");
                self.events.emit(FeedEvent::ReactionChanged {
                    item_id: item_id.to_string(),
                    liked: false,
                    count,
                });
                ToggleOutcome::Unliked { count }
            }
            Ok(_) => {
                tracing::warn!(item_id, "unlike not applied by server (status=false)");
                ToggleOutcome::Rejected
            }
            Err(e) => {
                tracing::warn!(item_id, "unlike failed: {e}");
                self.emit_failure(item_id, &e);
                ToggleOutcome::Failed(e)
            }
        }
    }

    async fn like_remote(
        &self,
        item_id: &str,
        control: &dyn LikeControl,
        token: Option<&str>,
    ) -> ToggleOutcome {
        let current = control.count();
        match self.api.create_reaction(item_id, token).await {
            Ok(res) if res.is_created() => {
                let count = res
                    .data
                    .like_count
                    .unwrap_or_else(|| current.saturating_add(1));

                self.store.set(item_id, item_id);
                control.set_heart(HeartState::Liked);
                control.set_count(count);

                tracing::debug!(item_id, count, "liked");
                self.events.emit(FeedEvent::ReactionChanged {
                    item_id: item_id.to_string(),
                    liked: true,
                    count,
                });
                ToggleOutcome::Liked { count }
            }
            Ok(res) => {
                tracing::warn!(item_id, code = res.code, "like not confirmed by server");
                ToggleOutcome::Rejected
            }
            Err(e) if e.is_already_liked() => {
                // Another tab or request won the race. The count is not guessed;
                // the next feed fetch corrects it.
                self.store.set(item_id, item_id);
                control.set_heart(HeartState::Liked);

                tracing::debug!(item_id, "already liked on server");
                self.events.emit(FeedEvent::ReactionChanged {
                    item_id: item_id.to_string(),
                    liked: true,
                    count: current,
                });
                ToggleOutcome::AlreadyLiked
            }
            Err(e) => {
                tracing::warn!(item_id, "like failed: {e}");
                self.emit_failure(item_id, &e);
                ToggleOutcome::Failed(e)
            }
        }
    }

    fn emit_failure(&self, item_id: &str, err: &ReactionError) {
        self.events.emit(FeedEvent::ToggleFailed {
            item_id: item_id.to_string(),
            message: err.message(),
        });
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-item in-flight marker. Dropping it re-renders the count, clears the
/// marker and re-enables the control, on success, failure or cancellation.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    item_id: String,
    control: &'a dyn LikeControl,
}

impl<'a> InFlight<'a> {
    fn acquire(
        set: &'a Mutex<HashSet<String>>,
        item_id: &str,
        control: &'a dyn LikeControl,
    ) -> Option<Self> {
        if !lock(set).insert(item_id.to_string()) {
            return None;
        }
        control.set_disabled(true);
        Some(Self {
            set,
            item_id: item_id.to_string(),
            control,
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.control.render_count();
        lock(self.set).remove(&self.item_id);
        self.control.set_disabled(false);
    }
}
