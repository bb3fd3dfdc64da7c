// Edits the deferred "thinking" response into the final answer.

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::info;

/// Platform limit on message content.
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Error, Debug)]
pub enum FollowUpError {
    #[error("follow-up request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("follow-up rejected: HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

pub fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    let mut out: String = content.chars().take(MAX_CONTENT_CHARS - 1).collect();
    out.push('…');
    out
}

#[derive(Clone)]
pub struct FollowUpClient {
    http: Client,
    api_base: url::Url,
}

impl FollowUpClient {
    pub fn new(http: Client, api_base: url::Url) -> Self {
        FollowUpClient { http, api_base }
    }

    /// One PATCH of the original response; the caller decides what a failure means.
    pub async fn send(
        &self,
        application_id: &str,
        token: &str,
        content: &str,
    ) -> Result<(), FollowUpError> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base.as_str().trim_end_matches('/'),
            application_id,
            token
        );

        let res = self
            .http
            .patch(url)
            .json(&json!({ "content": truncate_content(content) }))
            .send()
            .await?;

        let status = res.status();
        info!(
            "Follow-up for application {} answered {}",
            application_id,
            status.as_u16()
        );
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FollowUpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
