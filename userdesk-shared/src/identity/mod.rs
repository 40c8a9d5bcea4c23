/// External identity-provider adapter
///
/// The identity provider owns the canonical account-credential record
/// (email/password), issues the bearer tokens this service validates, and
/// assigns the subject identifier that joins provider accounts to local
/// records.
///
/// # Adapter Contract
///
/// The [`IdentityProvider`] trait is the seam the orchestration layer is
/// written against; the production implementation is [`http::HttpIdentityProvider`]
/// and tests substitute a recording mock. The provider client is constructed
/// once per process and passed explicitly, never reached as ambient state.
///
/// Operations are direct pass-throughs with no retries: a failed call
/// surfaces as an [`IdentityError`] and propagates to the HTTP layer.

pub mod http;

use async_trait::async_trait;

pub use http::HttpIdentityProvider;

/// Error type for identity-provider operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider rejected the request
    #[error("Identity provider returned {status}: {message}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Response body or a short description
        message: String,
    },

    /// The provider could not be reached
    #[error("Identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider responded with a body this adapter cannot parse
    #[error("Malformed identity provider response: {0}")]
    MalformedResponse(String),
}

/// Identity-provider account operations
///
/// All methods take the provider-assigned subject identifier except
/// [`create_account`](IdentityProvider::create_account), which returns it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a provider account for the given credentials
    ///
    /// Returns the subject identifier the provider assigned. The email must
    /// have passed the local uniqueness pre-check before this is called.
    async fn create_account(&self, email: &str, password: &str) -> Result<String, IdentityError>;

    /// Sets the single `role` claim on a provider account
    ///
    /// The orchestration layer passes the uppercased primary role.
    async fn set_role_claim(&self, subject_id: &str, role: &str) -> Result<(), IdentityError>;

    /// Updates the email on a provider account
    async fn update_email(&self, subject_id: &str, new_email: &str) -> Result<(), IdentityError>;

    /// Updates the password on a provider account
    async fn update_password(
        &self,
        subject_id: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// Deletes a provider account
    async fn delete_account(&self, subject_id: &str) -> Result<(), IdentityError>;
}
