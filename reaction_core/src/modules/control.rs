use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeartState {
    Liked,
    Unliked,
}

/// UI handle of a like button.
///
/// `count` is the stored attribute value; `render_count` copies it into the
/// visible text. Implementations use interior mutability because the renderer
/// and the engine hold the same handle across an in-flight request.
pub trait LikeControl: Send + Sync {
    fn item_id(&self) -> &str;
    fn count(&self) -> i64;
    fn set_count(&self, count: i64);
    fn render_count(&self);
    fn heart(&self) -> HeartState;
    fn set_heart(&self, heart: HeartState);
    fn is_disabled(&self) -> bool;
    fn set_disabled(&self, disabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub count: i64,
    pub text: String,
    pub heart: HeartState,
    pub disabled: bool,
}

/// Headless like button, used by the CLI and by tests.
#[derive(Debug)]
pub struct LikeButton {
    item_id: String,
    state: Mutex<ButtonState>,
}

impl LikeButton {
    pub fn new(item_id: impl Into<String>, count: i64, heart: HeartState) -> Self {
        Self {
            item_id: item_id.into(),
            state: Mutex::new(ButtonState {
                count,
                text: count.to_string(),
                heart,
                disabled: false,
            }),
        }
    }

    pub fn snapshot(&self) -> ButtonState {
        self.lock_state().clone()
    }

    /// Rendered count text.
    pub fn text(&self) -> String {
        self.lock_state().text.clone()
    }

    fn with_state(&self, f: impl FnOnce(&mut ButtonState)) {
        f(&mut self.lock_state());
    }

    fn lock_state(&self) -> MutexGuard<'_, ButtonState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LikeControl for LikeButton {
    fn item_id(&self) -> &str {
        &self.item_id
    }

    fn count(&self) -> i64 {
        self.lock_state().count
    }

    fn set_count(&self, count: i64) {
        self.with_state(|s| s.count = count);
    }

    fn render_count(&self) {
        self.with_state(|s| s.text = s.count.to_string());
    }

    fn heart(&self) -> HeartState {
        self.lock_state().heart
    }

    fn set_heart(&self, heart: HeartState) {
        self.with_state(|s| s.heart = heart);
    }

    fn is_disabled(&self) -> bool {
        self.lock_state().disabled
    }

    fn set_disabled(&self, disabled: bool) {
        self.with_state(|s| s.disabled = disabled);
    }
}

/// Item id -> control mapping kept by the rendering collaborator.
pub trait ControlLookup: Send + Sync {
    fn lookup_control(&self, item_id: &str) -> Option<Arc<dyn LikeControl>>;
}

#[derive(Default)]
pub struct ControlMap {
    controls: RwLock<HashMap<String, Arc<dyn LikeControl>>>,
}

impl ControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `control` under its own item id, replacing any previous one.
    pub fn register(&self, control: Arc<dyn LikeControl>) {
        let mut map = self.controls.write().unwrap_or_else(|e| e.into_inner());
        map.insert(control.item_id().to_string(), control);
    }

    pub fn unregister(&self, item_id: &str) -> Option<Arc<dyn LikeControl>> {
        let mut map = self.controls.write().unwrap_or_else(|e| e.into_inner());
        map.remove(item_id)
    }

    pub fn len(&self) -> usize {
        self.controls.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ControlLookup for ControlMap {
    fn lookup_control(&self, item_id: &str) -> Option<Arc<dyn LikeControl>> {
        let map = self.controls.read().unwrap_or_else(|e| e.into_inner());
        map.get(item_id).cloned()
    }
}
