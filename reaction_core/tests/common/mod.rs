#![allow(dead_code)]

use reaction_core::cache::MemoryLikeStore;
use reaction_core::control::{ControlMap, HeartState, LikeButton, LikeControl};
use reaction_core::protocol::{ApiResponse, LikeReceipt, UnlikeStatus, Verb};
use reaction_core::remote::{ReactionApi, ReactionError};
use reaction_core::session::StaticSession;
use reaction_core::Feed;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub type TestFeed = Feed<MockReactionApi, MemoryLikeStore>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    pub item_id: String,
    pub token: Option<String>,
}

#[derive(Default)]
struct Inner {
    like_replies: Mutex<VecDeque<Result<ApiResponse<LikeReceipt>, ReactionError>>>,
    unlike_replies: Mutex<VecDeque<Result<ApiResponse<UnlikeStatus>, ReactionError>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

/// Scripted reaction service. Without a scripted reply a like answers
/// `201` and an unlike answers `status: true`, both without a count.
#[derive(Clone, Default)]
pub struct MockReactionApi {
    inner: Arc<Inner>,
}

impl MockReactionApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call parks until a permit is added to the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let api = Self {
            inner: Arc::new(Inner {
                gate: Some(Arc::clone(&gate)),
                ..Inner::default()
            }),
        };
        (api, gate)
    }

    pub fn reply_like(&self, reply: Result<ApiResponse<LikeReceipt>, ReactionError>) {
        self.inner.like_replies.lock().unwrap().push_back(reply);
    }

    pub fn reply_unlike(&self, reply: Result<ApiResponse<UnlikeStatus>, ReactionError>) {
        self.inner.unlike_replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    fn record(&self, verb: Verb, item_id: &str, token: Option<&str>) {
        self.inner.calls.lock().unwrap().push(Call {
            verb,
            item_id: item_id.to_string(),
            token: token.map(str::to_string),
        });
    }

    async fn wait_gate(&self) {
        if let Some(gate) = self.inner.gate.as_ref() {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

impl ReactionApi for MockReactionApi {
    async fn create_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse<LikeReceipt>, ReactionError> {
        self.record(Verb::Post, item_id, token);
        self.wait_gate().await;
        let reply = self.inner.like_replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Ok(ApiResponse::new(
                201,
                LikeReceipt {
                    uuid: format!("like-{item_id}"),
                    like_count: None,
                },
            ))
        })
    }

    async fn remove_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse<UnlikeStatus>, ReactionError> {
        self.record(Verb::Patch, item_id, token);
        self.wait_gate().await;
        let reply = self.inner.unlike_replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Ok(ApiResponse::new(
                200,
                UnlikeStatus {
                    status: true,
                    like_count: None,
                },
            ))
        })
    }
}

pub fn rejected(status: u16, message: &str) -> ReactionError {
    ReactionError::Rejected {
        status,
        message: message.to_string(),
    }
}

pub fn feed_with(api: MockReactionApi) -> (TestFeed, Arc<ControlMap>) {
    let controls = Arc::new(ControlMap::new());
    let session = Arc::new(StaticSession::new(Some("guest-token".to_string())));
    let feed = Feed::new(api, MemoryLikeStore::default(), session, controls.clone());
    (feed, controls)
}

/// Registers a button for `item_id` and returns it.
pub fn button(controls: &ControlMap, item_id: &str, count: i64, heart: HeartState) -> Arc<LikeButton> {
    let b = Arc::new(LikeButton::new(item_id, count, heart));
    controls.register(b.clone());
    b
}

/// Cache membership and heart state agree.
pub fn assert_paired(feed: &TestFeed, control: &dyn LikeControl) {
    let cached = feed.engine().is_liked(control.item_id());
    let filled = control.heart() == HeartState::Liked;
    assert_eq!(cached, filled, "cache={cached} heart={:?}", control.heart());
}
