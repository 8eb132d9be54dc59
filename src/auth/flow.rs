//! Interactive OAuth consent via a loopback redirect.
//!
//! The installed-app flow for desktop clients: listen on `127.0.0.1` on an
//! ephemeral port, send the operator to Google's consent page with that
//! listener as `redirect_uri`, and wait for the browser to come back with
//! `?code=…&state=…`. PKCE (S256) binds the code to this process, and the
//! random `state` rejects redirects we did not ask for.
//!
//! How the operator is sent to the consent page is pluggable through
//! [`AuthorizationPrompt`]; the default opens the system browser and
//! prints the URL.

use crate::auth::secrets::ClientSecrets;
use crate::error::Pdf2SlidesError;
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{distributions::Alphanumeric, Rng, RngCore};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const CALLBACK_PAGE: &str = "<!doctype html><html><body style=\"font-family:sans-serif\">\
<h2>Signed in</h2><p>You can close this window and return to pdf2slides.</p></body></html>";

/// Directs the operator to the consent page.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Show or open `consent_url`. Returns once the operator has been
    /// directed there; the flow then waits for the redirect.
    async fn direct(&self, consent_url: &str) -> Result<(), Pdf2SlidesError>;
}

/// Opens the system browser (optionally) and always prints the URL.
pub struct BrowserPrompt {
    pub open_browser: bool,
}

#[async_trait]
impl AuthorizationPrompt for BrowserPrompt {
    async fn direct(&self, consent_url: &str) -> Result<(), Pdf2SlidesError> {
        eprintln!("Please visit this URL to authorise pdf2slides:\n\n  {consent_url}\n");
        if self.open_browser {
            if let Err(e) = webbrowser::open(consent_url) {
                warn!("Could not open a browser: {}", e);
            }
        }
        Ok(())
    }
}

/// PKCE verifier/challenge pair (RFC 7636, S256).
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Fresh random verifier (64 URL-safe characters).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 48];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// What the consent redirect delivered, ready for the code exchange.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
    pub verifier: String,
}

/// Query parameters of the consent redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Check the redirect against the `state` we sent and pull out the code.
    pub fn into_code(self, expected_state: &str) -> Result<String, Pdf2SlidesError> {
        if let Some(error) = self.error {
            return Err(Pdf2SlidesError::AuthorizationDenied { reason: error });
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(Pdf2SlidesError::AuthorizationDenied {
                reason: "state mismatch in redirect (possible CSRF)".into(),
            });
        }
        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Pdf2SlidesError::AuthorizationDenied {
                reason: "redirect carried no authorisation code".into(),
            })
    }

    fn is_redirect(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

/// Build the consent-page URL.
pub fn consent_url(
    secrets: &ClientSecrets,
    scopes: &[String],
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> Result<String, Pdf2SlidesError> {
    let scope = scopes.join(" ");
    let url = reqwest::Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| Pdf2SlidesError::ClientSecretsInvalid {
        path: "auth_uri".into(),
        detail: format!("'{}': {}", secrets.auth_uri, e),
    })?;
    Ok(url.into())
}

/// Run the loopback consent flow and return the authorisation code.
pub async fn obtain_authorization_code(
    secrets: &ClientSecrets,
    scopes: &[String],
    prompt: &dyn AuthorizationPrompt,
) -> Result<AuthorizationCode, Pdf2SlidesError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(|e| Pdf2SlidesError::Internal(format!("callback listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| Pdf2SlidesError::Internal(format!("callback listener: {e}")))?
        .port();
    let redirect_uri = format!("http://127.0.0.1:{port}/");
    info!("Waiting for the consent redirect on {}", redirect_uri);

    let pkce = Pkce::generate();
    let state = random_state();
    let url = consent_url(secrets, scopes, &redirect_uri, &state, &pkce.challenge)?;

    let (params_tx, mut params_rx) = mpsc::channel::<CallbackParams>(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = Router::new()
        .route("/", get(callback))
        .with_state(params_tx);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let outcome = match prompt.direct(&url).await {
        Ok(()) => params_rx.recv().await.ok_or_else(|| {
            Pdf2SlidesError::Internal("callback listener stopped before the redirect".into())
        }),
        Err(e) => Err(e),
    };

    // Close the channel first so no late redirect can hold up the shutdown.
    drop(params_rx);
    let _ = shutdown_tx.send(());
    if let Err(e) = server.await {
        debug!("callback listener task ended abnormally: {}", e);
    }

    let code = outcome?.into_code(&state)?;
    Ok(AuthorizationCode {
        code,
        redirect_uri,
        verifier: pkce.verifier,
    })
}

async fn callback(
    State(tx): State<mpsc::Sender<CallbackParams>>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    // Only the first redirect counts; repeats (a reload) get the same page.
    if params.is_redirect() && tx.try_send(params).is_err() {
        debug!("ignoring repeated consent redirect");
    }
    Html(CALLBACK_PAGE)
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
