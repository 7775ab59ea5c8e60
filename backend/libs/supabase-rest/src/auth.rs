use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::{Result, SupabaseClient};

/// Identity attached to a bearer token by the external auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl SupabaseClient {
    /// Resolve a session bearer token to its user.
    ///
    /// Returns `Ok(None)` for missing/expired sessions (401/403) so
    /// callers can distinguish "signed out" from provider failure.
    pub async fn auth_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let resp = self
            .http()
            .get(self.auth_url())
            .header("apikey", self.api_key())
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            debug!("auth lookup rejected ({}): treating as signed out", status);
            return Ok(None);
        }
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let user: AuthUser = serde_json::from_str(&body)?;
        Ok(Some(user))
    }
}
