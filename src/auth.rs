use crate::api::TokenResponse;
use crate::error::AuthError;
use attohttpc::StatusCode;
use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};
use std::fmt;

// Upper bound for `expires_in`, keeps the chrono arithmetic in range.
const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// API client credentials.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token with the expiry the token endpoint announced, if any.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        AccessToken {
            secret: secret.into(),
            expires_at,
        }
    }

    fn from_response(resp: TokenResponse, issued_at: DateTime<Utc>) -> Result<Self, AuthError> {
        let secret = resp
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::EmptyToken)?;
        let expires_at = resp
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| issued_at + Duration::seconds(secs.min(MAX_TOKEN_LIFETIME_SECS)));
        Ok(AccessToken::new(secret, expires_at))
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True if the token is expired at `now + margin`. Tokens without an expiry never are.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: std::time::Duration) -> bool {
        let margin = Duration::from_std(margin).unwrap_or_else(|_| Duration::zero());
        match self.expires_at {
            Some(expires_at) => now + margin >= expires_at,
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Performs the OAuth2 client-credentials exchange against the tenant.
#[derive(Debug, Clone)]
pub struct Authenticator {
    token_url: String,
    credentials: Credentials,
    timeout: std::time::Duration,
}

impl Authenticator {
    pub fn new(token_url: String, credentials: Credentials, timeout: std::time::Duration) -> Self {
        Authenticator {
            token_url,
            credentials,
            timeout,
        }
    }

    pub fn authenticate(&self) -> Result<AccessToken, AuthError> {
        debug!("Requesting access token from {}", self.token_url);
        let issued_at = Utc::now();
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let resp = attohttpc::post(&self.token_url)
            .timeout(self.timeout)
            .form(&params)?
            .send()?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(AuthError::Status(status));
        }
        let body = resp.text()?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        trace!(
            "Token response: type={:?} expires_in={:?}",
            token.token_type,
            token.expires_in
        );
        AccessToken::from_response(token, issued_at)
    }
}
