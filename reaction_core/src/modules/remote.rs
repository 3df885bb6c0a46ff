use std::future::Future;
use std::time::Duration;

use reaction_protocol::{paths, ApiResponse, ErrorBody, LikeReceipt, UnlikeStatus, Verb};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

const ALREADY_LIKED: &str = "already liked";

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("reaction request rejected: status={status} message={message}")]
    Rejected { status: u16, message: String },
    #[error("reaction response parse failed: {0}")]
    Parse(String),
    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),
}

impl ReactionError {
    pub fn message(&self) -> String {
        match self {
            ReactionError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// The server refused a like because one already exists for this client.
    /// Treated as a benign race, not a failure.
    pub fn is_already_liked(&self) -> bool {
        match self {
            ReactionError::Rejected { message, .. } => {
                message.to_ascii_lowercase().contains(ALREADY_LIKED)
            }
            _ => false,
        }
    }
}

/// Remote authority for reaction counts.
pub trait ReactionApi: Send + Sync {
    /// `POST /api/comment/{id}`.
    fn create_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<ApiResponse<LikeReceipt>, ReactionError>> + Send;

    /// `PATCH /api/comment/{id}`.
    fn remove_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<ApiResponse<UnlikeStatus>, ReactionError>> + Send;
}

pub struct HttpReactionApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpReactionApi {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ReactionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, item_id: &str) -> Result<Url, ReactionError> {
        if !is_valid_item_id(item_id) {
            return Err(ReactionError::InvalidItemId(item_id.to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ReactionError::Parse(format!("base url cannot carry a path: {}", self.base)))?
            .pop_if_empty()
            .extend(paths::comment_reaction(item_id));
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        verb: Verb,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse<T>, ReactionError> {
        let url = self.endpoint(item_id)?;
        let mut req = match verb {
            Verb::Post => self.client.post(url),
            Verb::Patch => self.client.patch(url),
        }
        .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(?verb, item_id, status = status.as_u16(), "reaction response");
        parse_response(status, &body)
    }
}

impl ReactionApi for HttpReactionApi {
    async fn create_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse<LikeReceipt>, ReactionError> {
        self.send(Verb::Post, item_id, token).await
    }

    async fn remove_reaction(
        &self,
        item_id: &str,
        token: Option<&str>,
    ) -> Result<ApiResponse<UnlikeStatus>, ReactionError> {
        self.send(Verb::Patch, item_id, token).await
    }
}

fn is_valid_item_id(item_id: &str) -> bool {
    !item_id.is_empty()
        && item_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

fn parse_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<T>, ReactionError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(ReactionError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let mut parsed: ApiResponse<T> =
        serde_json::from_str(body).map_err(|e| ReactionError::Parse(format!("{e}: {body}")))?;
    // Some deployments omit `code` in the body; the transport status is the fallback.
    if parsed.code == 0 {
        parsed.code = status.as_u16();
    }
    Ok(parsed)
}
