use serde::{Deserialize, Serialize};

pub const HTTP_STATUS_OK: u16 = 200;
pub const HTTP_STATUS_CREATED: u16 = 201;

/// Envelope every comment endpoint answers with.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: u16,
    pub data: T,
    #[serde(default)]
    pub error: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn new(code: u16, data: T) -> Self {
        Self {
            code,
            data,
            error: None,
        }
    }

    /// Like creation is confirmed by either 201 or a plain 200.
    pub fn is_created(&self) -> bool {
        self.code == HTTP_STATUS_CREATED || self.code == HTTP_STATUS_OK
    }
}

/// Receipt returned by `POST /api/comment/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LikeReceipt {
    #[serde(alias = "id")]
    pub uuid: String,
    #[serde(default)]
    pub like_count: Option<i64>,
}

/// Status returned by `PATCH /api/comment/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnlikeStatus {
    pub status: bool,
    #[serde(default)]
    pub like_count: Option<i64>,
}

/// Body of a non-2xx answer. `error` carries human readable messages.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub error: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        let msgs = self.error.as_ref()?;
        let joined = msgs
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Post,
    Patch,
}

pub mod paths {
    pub const COMMENT_SEGMENTS: [&str; 2] = ["api", "comment"];

    /// Path segments of the reaction endpoint, appended to the configured base path.
    pub fn comment_reaction(item_id: &str) -> [&str; 3] {
        let [api, comment] = COMMENT_SEGMENTS;
        [api, comment, item_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_accepts_id_alias_and_missing_count() {
        let r: ApiResponse<LikeReceipt> =
            serde_json::from_str(r#"{"code":201,"data":{"id":"abc"}}"#).unwrap();
        assert!(r.is_created());
        assert_eq!(r.data.uuid, "abc");
        assert_eq!(r.data.like_count, None);
    }

    #[test]
    fn error_body_joins_messages() {
        let b: ErrorBody =
            serde_json::from_str(r#"{"code":400,"data":[],"error":["already liked", " "]}"#)
                .unwrap();
        assert_eq!(b.message().as_deref(), Some("already liked"));
        assert_eq!(ErrorBody::default().message(), None);
    }

    #[test]
    fn unlike_status_count_is_optional() {
        let s: UnlikeStatus = serde_json::from_str(r#"{"status":true}"#).unwrap();
        assert!(s.status);
        assert_eq!(s.like_count, None);
        assert_eq!(paths::comment_reaction("x-1"), ["api", "comment", "x-1"]);
    }
}
