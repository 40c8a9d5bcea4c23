/// HTTP implementation of the identity-provider adapter
///
/// Talks to the provider's admin REST API with a service bearer token:
///
/// ```text
/// POST   {api_url}/v1/accounts                    {"email", "password"} -> {"subjectId"}
/// PUT    {api_url}/v1/accounts/{subject}/claims   {"role"}
/// PATCH  {api_url}/v1/accounts/{subject}          {"email"} or {"password"}
/// DELETE {api_url}/v1/accounts/{subject}
/// ```
///
/// Non-2xx responses map to [`IdentityError::Provider`] with the status and
/// body text; transport failures map to [`IdentityError::Transport`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{IdentityError, IdentityProvider};

/// Identity-provider admin API client
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedAccount {
    subject_id: String,
}

impl HttpIdentityProvider {
    /// Creates a client for the provider's admin API
    ///
    /// `api_url` is the base URL without a trailing slash; `api_key` is the
    /// service credential sent as a bearer token.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn account_url(&self, subject_id: &str) -> String {
        format!("{}/v1/accounts/{}", self.api_url, subject_id)
    }

    /// Maps a provider response to `()` or a provider error
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        Err(IdentityError::Provider {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        debug!(email = %email, "Creating identity provider account");

        let response = self
            .client
            .post(format!("{}/v1/accounts", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check(response).await?;

        let created: CreatedAccount = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        Ok(created.subject_id)
    }

    async fn set_role_claim(&self, subject_id: &str, role: &str) -> Result<(), IdentityError> {
        debug!(subject_id = %subject_id, role = %role, "Setting role claim");

        let response = self
            .client
            .put(format!("{}/claims", self.account_url(subject_id)))
            .bearer_auth(&self.api_key)
            .json(&json!({ "role": role }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_email(&self, subject_id: &str, new_email: &str) -> Result<(), IdentityError> {
        debug!(subject_id = %subject_id, "Updating provider account email");

        let response = self
            .client
            .patch(self.account_url(subject_id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "email": new_email }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        subject_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        debug!(subject_id = %subject_id, "Updating provider account password");

        let response = self
            .client
            .patch(self.account_url(subject_id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_account(&self, subject_id: &str) -> Result<(), IdentityError> {
        debug!(subject_id = %subject_id, "Deleting identity provider account");

        let response = self
            .client
            .delete(self.account_url(subject_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}
