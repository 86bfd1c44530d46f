//! Access token supply
//!
//! The Drive client never performs the OAuth2 consent flow itself; it asks
//! an [`AccessTokenProvider`] for a bearer token before each request. When
//! the provider cannot produce a token without user interaction it returns
//! [`RemoteError::NeedsAuthorization`] so the sync pass can abort cleanly
//! and the host can surface a consent prompt.

use vaultsync_core::ports::RemoteError;

/// Port for supplying OAuth2 bearer tokens to the Drive client
#[async_trait::async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A bearer token valid for the next request
    ///
    /// Returns [`RemoteError::NeedsAuthorization`] when renewed user consent
    /// is required before a token can be issued.
    async fn access_token(&self) -> Result<String, RemoteError>;

    /// Opaque handle identifying this provider's pending consent flow
    ///
    /// Included in [`RemoteError::NeedsAuthorization`] when the service
    /// rejects a token mid-pass, so the host can resume consent later.
    fn consent_handle(&self) -> String;
}

/// Token provider holding a fixed, pre-issued token
///
/// Used in tests and in scripting contexts where a token was obtained
/// out-of-band.
pub struct StaticTokenProvider {
    token: String,
    handle: String,
}

impl StaticTokenProvider {
    /// Creates a provider that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            handle: "static".to_string(),
        }
    }

    /// Sets the consent handle reported on authorization failures
    #[must_use]
    pub fn with_consent_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = handle.into();
        self
    }
}

#[async_trait::async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, RemoteError> {
        Ok(self.token.clone())
    }

    fn consent_handle(&self) -> String {
        self.handle.clone()
    }
}
