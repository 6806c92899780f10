//! Bearer-token provider contract.
//!
//! # Responsibility
//! - Supply access tokens for store writes.
//! - Expose session restore / sign-in / sign-out hooks driving the engine's
//!   authentication flag.
//!
//! # Invariants
//! - A provider without a session returns `None` from `access_token`; callers
//!   send the request unauthenticated instead of blocking.

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::RwLock;

/// Sign-in failures surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInError {
    /// No user session could be established.
    UserMissing,
    /// The session lacks scopes needed for writes.
    ScopesMissing,
}

impl Display for SignInError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserMissing => write!(f, "user authentication failed"),
            Self::ScopesMissing => write!(f, "some authorization scopes are missing"),
        }
    }
}

impl Error for SignInError {}

/// Source of bearer tokens for the row store.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current access token, if a session is active.
    async fn access_token(&self) -> Option<String>;

    /// Restores an earlier session; returns whether one is active.
    async fn restore_previous_session(&self) -> bool;

    /// Starts a session.
    async fn sign_in(&self) -> Result<(), SignInError>;

    /// Ends the current session.
    async fn sign_out(&self);
}

/// Provider serving a pre-issued token, e.g. from configuration.
///
/// Signing out drops the session; signing in restores it only when a token
/// was configured.
pub struct StaticTokenProvider {
    configured: Option<String>,
    active: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    /// Creates a provider with an active session when `token` is present.
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|value| !value.trim().is_empty());
        Self {
            active: RwLock::new(token.clone()),
            configured: token,
        }
    }

    /// Provider that never has a session.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    fn set_active(&self, value: Option<String>) {
        match self.active.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    fn current(&self) -> Option<String> {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.current()
    }

    async fn restore_previous_session(&self) -> bool {
        self.current().is_some()
    }

    async fn sign_in(&self) -> Result<(), SignInError> {
        match &self.configured {
            Some(token) => {
                self.set_active(Some(token.clone()));
                info!("event=sign_in module=auth status=ok provider=static");
                Ok(())
            }
            None => Err(SignInError::UserMissing),
        }
    }

    async fn sign_out(&self) {
        self.set_active(None);
        info!("event=sign_out module=auth status=ok provider=static");
    }
}
