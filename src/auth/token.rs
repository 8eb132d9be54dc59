//! The persisted "authorised user" token bundle.
//!
//! The on-disk layout is Google's authorised-user JSON, so a `token.json`
//! written by other Google client libraries can be picked up as is:
//!
//! ```json
//! {
//!   "token": "ya29.a0…",
//!   "refresh_token": "1//0g…",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "…apps.googleusercontent.com",
//!   "client_secret": "…",
//!   "scopes": ["https://www.googleapis.com/auth/presentations", "…"],
//!   "expiry": "2026-10-19T09:41:12.512345Z"
//! }
//! ```
//!
//! Unknown keys (`universe_domain`, `account`, …) are carried through a
//! load/save cycle untouched.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Google's OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A token this close to its expiry is treated as already expired, so it
/// cannot lapse halfway through a run.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Authorised-user credential: access token plus what is needed to renew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Current access token.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access-token expiry. `None` means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUser {
    /// Usable right now: has an access token that is not (nearly) expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty()) && !self.is_expired(now)
    }

    /// Expiry is at most [`EXPIRY_SKEW_SECS`] away (or already past).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    /// Can be renewed without the operator.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Every scope in `required` was granted to this credential.
    pub fn covers_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|s| self.scopes.contains(s))
    }

    /// The bearer token to send, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Fold a token-endpoint reply into this credential.
    ///
    /// A reply without `refresh_token` keeps the existing one: Google only
    /// rotates it occasionally. A reply without `scope` keeps the stored list.
    pub fn apply(&mut self, reply: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(reply.access_token);
        self.expiry = reply.expires_in.map(|secs| now + Duration::seconds(secs));
        if let Some(refresh) = reply.refresh_token {
            self.refresh_token = Some(refresh);
        }
        if let Some(scope) = reply.scope {
            let granted: Vec<String> = scope.split_whitespace().map(String::from).collect();
            if !granted.is_empty() {
                self.scopes = granted;
            }
        }
    }
}

/// Successful reply from the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}
