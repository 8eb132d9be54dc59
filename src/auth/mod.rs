//! Google OAuth for an installed (desktop) application.
//!
//! ```text
//! token.json ──load──▶ valid? ──yes──▶ use
//!                        │ no
//!                        ▼
//!              refresh token? ──yes──▶ refresh ──ok──▶ save ▶ use
//!                        │ no                  │ rejected
//!                        ▼                     ▼
//!        credentials.json ▶ loopback consent ▶ code exchange ▶ save ▶ use
//! ```
//!
//! * [`token`]: the persisted authorised-user bundle and its validity rules
//! * [`secrets`]: the operator-supplied OAuth client file
//! * [`flow`]: the interactive consent round-trip (loopback + PKCE)
//! * [`store`]: [`CredentialStore::acquire`], tying the above together

pub mod flow;
pub mod secrets;
pub mod store;
pub mod token;

pub use flow::{AuthorizationPrompt, BrowserPrompt};
pub use secrets::ClientSecrets;
pub use store::CredentialStore;
pub use token::AuthorizedUser;
