//! Newsletter subscription proxy.
//!
//! The client never talks to the mail provider directly; this service
//! forwards the signup to the provider's group-subscriber endpoint and
//! relays the provider's own status and body when it rejects one.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::NewsletterConfig;
use crate::error::{AppError, Result};

/// What the provider said. `Rejected` carries the upstream status and
/// body verbatim so the handler can relay them.
pub enum SubscribeOutcome {
    Subscribed,
    Rejected { status: u16, body: Value },
}

pub struct NewsletterService {
    http: reqwest::Client,
    config: NewsletterConfig,
}

impl NewsletterService {
    pub fn new(config: NewsletterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome> {
        let url = format!(
            "{}/groups/{}/subscribers",
            self.config.api_url, self.config.group_id
        );
        let resp = self
            .http
            .post(&url)
            .header("X-MailerLite-ApiKey", &self.config.api_key)
            .json(&json!({ "email": email, "resubscribe": true }))
            .send()
            .await
            .map_err(|e| {
                error!("mail api unreachable: {}", e);
                AppError::Upstream("newsletter provider unreachable".to_string())
            })?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            info!(email, "newsletter subscription accepted");
            Ok(SubscribeOutcome::Subscribed)
        } else {
            error!(email, status = status.as_u16(), "mail api rejected subscription");
            Ok(SubscribeOutcome::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
