//! Credential acquisition: load, refresh, or interactively re-create the token.

use crate::auth::flow::{obtain_authorization_code, AuthorizationPrompt, BrowserPrompt};
use crate::auth::secrets::ClientSecrets;
use crate::auth::token::{AuthorizedUser, TokenResponse};
use crate::config::ConversionConfig;
use crate::error::Pdf2SlidesError;
use crate::google::api::read_error_body;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads, refreshes and persists the operator's Google credential.
///
/// [`CredentialStore::acquire`] walks the fallback chain:
///
/// 1. stored token still valid → use it;
/// 2. expired but refreshable → refresh, persist, use it;
/// 3. anything else (missing, unparsable, wrong scopes, refresh rejected)
///    → interactive consent, persist, use it.
pub struct CredentialStore {
    token_path: PathBuf,
    client_secrets_path: PathBuf,
    scopes: Vec<String>,
    http: reqwest::Client,
    prompt: Arc<dyn AuthorizationPrompt>,
}

impl CredentialStore {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            token_path: config.token_path.clone(),
            client_secrets_path: config.client_secrets_path.clone(),
            scopes: config.scopes.clone(),
            http: reqwest::Client::new(),
            prompt: Arc::new(BrowserPrompt {
                open_browser: config.open_browser,
            }),
        }
    }

    /// Replace how the operator is sent to the consent page.
    pub fn with_prompt(mut self, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Return a credential that is valid right now.
    pub async fn acquire(&self) -> Result<AuthorizedUser, Pdf2SlidesError> {
        if let Some(stored) = self.load().await {
            if stored.is_valid(Utc::now()) {
                debug!("Using stored token from {}", self.token_path.display());
                return Ok(stored);
            }
            if stored.can_refresh() {
                match self.refresh(stored).await {
                    Ok(refreshed) => {
                        self.save(&refreshed).await?;
                        info!("Access token refreshed");
                        return Ok(refreshed);
                    }
                    Err(e) => warn!("Token refresh failed, signing in again: {}", e),
                }
            }
        }

        let fresh = self.authorize_interactively().await?;
        self.save(&fresh).await?;
        info!("Signed in; token saved to {}", self.token_path.display());
        Ok(fresh)
    }

    /// Read the token file; anything unusable is discarded as if missing.
    async fn load(&self) -> Option<AuthorizedUser> {
        let raw = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", self.token_path.display(), e);
                return None;
            }
        };
        let user: AuthorizedUser = match serde_json::from_str(&raw) {
            Ok(u) => u,
            Err(e) => {
                warn!("Ignoring corrupt token file {}: {}", self.token_path.display(), e);
                return None;
            }
        };
        if !user.covers_scopes(&self.scopes) {
            warn!("Stored token lacks required scopes; signing in again");
            return None;
        }
        Some(user)
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, mut user: AuthorizedUser) -> Result<AuthorizedUser, Pdf2SlidesError> {
        let (client_id, client_secret) = match (&user.client_id, &user.client_secret) {
            (Some(id), Some(secret)) => (id.clone(), secret.clone()),
            _ => {
                let secrets = ClientSecrets::load(&self.client_secrets_path).await?;
                (secrets.client_id, secrets.client_secret)
            }
        };
        let refresh_token = user.refresh_token.clone().unwrap_or_default();

        let reply = self
            .token_request(
                &user.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                ],
            )
            .await?;

        user.client_id = Some(client_id);
        user.client_secret = Some(client_secret);
        user.apply(reply, Utc::now());
        Ok(user)
    }

    /// Full consent flow followed by the code exchange.
    async fn authorize_interactively(&self) -> Result<AuthorizedUser, Pdf2SlidesError> {
        let secrets = ClientSecrets::load(&self.client_secrets_path).await?;
        let grant = obtain_authorization_code(&secrets, &self.scopes, self.prompt.as_ref()).await?;

        let reply = self
            .token_request(
                &secrets.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", grant.code.as_str()),
                    ("redirect_uri", grant.redirect_uri.as_str()),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                    ("code_verifier", grant.verifier.as_str()),
                ],
            )
            .await?;

        let mut user = AuthorizedUser {
            token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: Some(secrets.client_id.clone()),
            client_secret: Some(secrets.client_secret.clone()),
            scopes: self.scopes.clone(),
            expiry: None,
            extra: Default::default(),
        };
        user.apply(reply, Utc::now());
        Ok(user)
    }

    async fn token_request(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, Pdf2SlidesError> {
        const OP: &str = "OAuth token request";
        let resp = self
            .http
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(Pdf2SlidesError::http(OP))?;

        let status = resp.status();
        if !status.is_success() {
            let body = read_error_body(resp).await;
            if body.code.as_deref() == Some("invalid_grant") {
                return Err(Pdf2SlidesError::InvalidGrant {
                    detail: body.message,
                });
            }
            return Err(Pdf2SlidesError::Api {
                operation: OP,
                status: status.as_u16(),
                message: body.message,
            });
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| Pdf2SlidesError::UnexpectedResponse {
                operation: OP,
                detail: e.to_string(),
            })
    }

    /// Overwrite the token file, creating its directory if needed.
    async fn save(&self, user: &AuthorizedUser) -> Result<(), Pdf2SlidesError> {
        let store_err = |source: std::io::Error| Pdf2SlidesError::TokenStoreFailed {
            path: self.token_path.clone(),
            source,
        };
        if let Some(parent) = self.token_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(store_err)?;
        }
        let json = serde_json::to_string_pretty(user)
            .map_err(|e| Pdf2SlidesError::Internal(format!("serialise token: {e}")))?;
        tokio::fs::write(&self.token_path, json)
            .await
            .map_err(store_err)?;
        restrict_permissions(&self.token_path);
        Ok(())
    }
}

/// The token file holds a long-lived secret: keep it owner-only where we can.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        debug!("chmod 600 {} failed: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
