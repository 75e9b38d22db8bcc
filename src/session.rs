//! Session context and auth-callback handling.
//!
//! The session is the gate for every network operation: without a token,
//! downstream fetches and sends silently do nothing. It is an explicit
//! object passed by reference to consumers, never ambient state.

use crate::address::Address;
use crate::models::UserProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authenticated identity plus per-source connection flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
    authenticated: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the credential. Identity arrives separately via `set_identity`.
    pub fn initialize(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Store the identity and mark the session authenticated.
    pub fn set_identity(&mut self, user: UserProfile) {
        self.user = Some(user);
        self.authenticated = true;
    }

    /// Reset token, identity and the authenticated flag together.
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
        self.authenticated = false;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn spotify_connected(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.spotify_connected)
    }
}

/// Error codes the identity provider can hand back on the callback address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("You cancelled the sign in. Please try again.")]
    AccessDenied,
    #[error("OAuth configuration error. Please contact support.")]
    InvalidClient,
    #[error("Sign in expired. Please try again.")]
    InvalidGrant,
    #[error("Sign in was interrupted. Please try again.")]
    MissingCode,
    #[error("Could not load your account. Please try again.")]
    SessionError,
    #[error("Could not retrieve your Google profile. Please try again.")]
    UserinfoFailed,
    #[error("An unexpected error occurred. Please try again.")]
    UnknownError,
    /// Unmapped provider codes fall back to a generic templated message.
    #[error("Sign in failed: {0}")]
    Other(String),
}

impl AuthError {
    pub fn from_code(code: &str) -> Self {
        match code {
            "access_denied" => AuthError::AccessDenied,
            "invalid_client" => AuthError::InvalidClient,
            "invalid_grant" => AuthError::InvalidGrant,
            "missing_code" => AuthError::MissingCode,
            "session_error" => AuthError::SessionError,
            "userinfo_failed" => AuthError::UserinfoFailed,
            "unknown_error" => AuthError::UnknownError,
            other => AuthError::Other(other.to_string()),
        }
    }
}

/// Result of consuming the identity provider's callback address.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Token received; the caller should fetch the profile next and then
    /// land on the dashboard.
    SignedIn { token: String },
    /// Sign-in failed; the caller returns to the entry page with this error.
    Failed(AuthError),
}

/// Consume the callback address: read `token` or `error` and clear the
/// query string so the parameters are not observed again.
pub fn consume_callback(address: &mut Address) -> CallbackOutcome {
    let outcome = if let Some(code) = address.get("error") {
        CallbackOutcome::Failed(AuthError::from_code(code))
    } else if let Some(token) = address.get("token") {
        CallbackOutcome::SignedIn {
            token: token.to_string(),
        }
    } else {
        CallbackOutcome::Failed(AuthError::MissingCode)
    };

    address.clear_query();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(spotify: bool) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: "A B".to_string(),
            picture: String::new(),
            spotify_connected: spotify,
            google_fit_connected: false,
            notion_connected: false,
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut session = Session::new();
        assert!(session.token().is_none());
        assert!(!session.is_authenticated());

        session.initialize("tok-1");
        assert_eq!(session.token(), Some("tok-1"));
        assert!(!session.is_authenticated());

        session.set_identity(profile(true));
        assert!(session.is_authenticated());
        assert!(session.spotify_connected());

        session.clear();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_consume_callback_success_clears_query() {
        let mut addr = Address::parse("/auth/callback?token=abc");
        let outcome = consume_callback(&mut addr);
        assert_eq!(
            outcome,
            CallbackOutcome::SignedIn {
                token: "abc".to_string()
            }
        );
        assert!(!addr.has_query());
    }

    #[test]
    fn test_consume_callback_error_takes_precedence() {
        let mut addr = Address::parse("/auth/callback?error=access_denied&token=abc");
        let outcome = consume_callback(&mut addr);
        assert_eq!(outcome, CallbackOutcome::Failed(AuthError::AccessDenied));
        assert!(!addr.has_query());
    }

    #[test]
    fn test_consume_callback_missing_both() {
        let mut addr = Address::parse("/auth/callback");
        assert_eq!(
            consume_callback(&mut addr),
            CallbackOutcome::Failed(AuthError::MissingCode)
        );
    }

    #[test]
    fn test_error_messages_mapped() {
        assert_eq!(
            AuthError::from_code("invalid_grant").to_string(),
            "Sign in expired. Please try again."
        );
        assert_eq!(
            AuthError::from_code("mystery_code").to_string(),
            "Sign in failed: mystery_code"
        );
    }
}
