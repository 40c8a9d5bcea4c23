/// Bearer-token validation against the identity provider
///
/// Tokens are issued by the external identity provider and signed with
/// RS256; this service never mints tokens of its own. Validation fetches the
/// provider's JWK set from a configured key-set endpoint, caches it, and
/// re-fetches when an unknown `kid` shows up or the cache goes stale.
///
/// # Claims
///
/// - `sub`: provider subject identifier, the join key to the local record
/// - `iss`: issuer, checked against the configured value
/// - `exp` / `iat`: standard expiry checks
/// - `email`: optional, informational
/// - `role`: optional custom claim set at account creation; `ADMIN` gates
///   the administrative routes
///
/// # Example
///
/// ```no_run
/// use userdesk_shared::auth::jwt::TokenVerifier;
///
/// # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = TokenVerifier::new(
///     "https://auth.example.com/.well-known/jwks.json",
///     "https://auth.example.com",
/// );
///
/// let claims = verifier.verify(token).await?;
/// println!("Authenticated subject: {}", claims.sub);
/// # Ok(())
/// # }
/// ```

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long a fetched key set is trusted before a re-fetch
const KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Error type for token validation
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Key-set endpoint could not be fetched or parsed
    #[error("Failed to fetch key set: {0}")]
    KeySetFetch(String),

    /// Token header carries no key id
    #[error("Token header has no key id")]
    MissingKeyId,

    /// No key in the set matches the token's key id
    #[error("No key matches key id {0}")]
    UnknownKey(String),

    /// A key in the set could not be converted into a decoding key
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token issuer does not match the configured issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Token is not a well-formed JWT
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// Signature or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),
}

/// Claims carried by the provider's bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - provider-assigned account identifier
    pub sub: String,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    /// Issued-at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Account email, when the provider includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Custom role claim set at account creation (e.g. "ADMIN", "USER")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Validates provider-issued bearer tokens against a remote JWK set
///
/// Constructed once per process and shared behind an `Arc`; the key-set
/// cache is guarded by an async `RwLock` so concurrent requests don't
/// stampede the endpoint.
pub struct TokenVerifier {
    jwks_url: String,
    issuer: String,
    client: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl TokenVerifier {
    /// Creates a verifier for the given key-set endpoint and expected issuer
    pub fn new(jwks_url: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            client: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    /// Validates a bearer token and returns its claims
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` for expired tokens, `InvalidIssuer` for
    /// issuer mismatches, and `UnknownKey` when the token's key id is absent
    /// from the provider's key set even after a re-fetch.
    pub async fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let header =
            decode_header(token).map_err(|e| JwtError::InvalidFormat(e.to_string()))?;
        let kid = header.kid.ok_or(JwtError::MissingKeyId)?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|e| JwtError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                _ => JwtError::ValidationError(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// Looks up the key for `kid`, re-fetching the set when the cache is
    /// stale or the kid is unknown
    async fn key_for(&self, kid: &str) -> Result<Jwk, JwtError> {
        {
            let cached = self.keys.read().await;
            if let Some(ref keys) = *cached {
                if keys.fetched_at.elapsed() < KEY_SET_TTL {
                    if let Some(jwk) = keys.set.find(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        // Cache miss: unknown kid or stale set
        let set = self.fetch_key_set().await?;
        let jwk = set.find(kid).cloned();

        let mut cached = self.keys.write().await;
        *cached = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        jwk.ok_or_else(|| JwtError::UnknownKey(kid.to_string()))
    }

    async fn fetch_key_set(&self) -> Result<JwkSet, JwtError> {
        tracing::debug!(url = %self.jwks_url, "Fetching identity provider key set");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwtError::KeySetFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| JwtError::KeySetFetch(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| JwtError::KeySetFetch(e.to_string()))
    }
}
