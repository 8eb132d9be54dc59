//! OAuth client registration (`credentials.json`).
//!
//! Downloaded by the operator from the Google Cloud console. Both the
//! "Desktop app" (`installed`) and "Web application" (`web`) layouts are
//! accepted; the file is never written.

use crate::auth::token::DEFAULT_TOKEN_URI;
use crate::error::Pdf2SlidesError;
use serde::Deserialize;
use std::path::Path;

/// Google's OAuth 2.0 consent endpoint.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// The client identity used for consent and token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Read and parse the client file at `path`.
    pub async fn load(path: &Path) -> Result<Self, Pdf2SlidesError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Pdf2SlidesError::ClientSecretsMissing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(Pdf2SlidesError::ClientSecretsInvalid {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
            }
        };
        Self::parse(&raw).map_err(|detail| Pdf2SlidesError::ClientSecretsInvalid {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// Parse the JSON text of a client file.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" client".to_string())?;
        if secrets.client_id.trim().is_empty() {
            return Err("client_id is empty".into());
        }
        Ok(secrets)
    }
}
