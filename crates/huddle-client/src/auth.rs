//! The authentication handshake, seen from the core.
//!
//! Whatever actually signs users in (OAuth popup, magic link, ...) sits
//! behind [`AuthProvider`]. The core only needs the resulting uid and the
//! email the provider vouches for.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use huddle_shared::Uid;

use crate::error::AuthError;

/// What a successful handshake yields. `email` is reported verbatim and is
/// normalized by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub uid: Uid,
    pub email: String,
}

pub trait AuthProvider: Send + Sync {
    /// Run the interactive handshake.
    fn authenticate(&self) -> impl Future<Output = Result<AuthIdentity, AuthError>> + Send;

    /// Revoke whatever session the last handshake established.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

impl<T: AuthProvider> AuthProvider for Arc<T> {
    fn authenticate(&self) -> impl Future<Output = Result<AuthIdentity, AuthError>> + Send {
        (**self).authenticate()
    }

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send {
        (**self).sign_out()
    }
}

/// Provider that always resolves to one preconfigured outcome.
///
/// Used for local development without an identity service, and in tests,
/// where the handshake and sign-out counters make side effects observable.
#[derive(Debug)]
pub struct StaticAuthProvider {
    outcome: Result<AuthIdentity, AuthError>,
    handshakes: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl StaticAuthProvider {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_outcome(Ok(AuthIdentity {
            uid: Uid::new(uid),
            email: email.into(),
        }))
    }

    /// A provider whose every handshake fails with `error`.
    pub fn failing(error: AuthError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<AuthIdentity, AuthError>) -> Self {
        Self {
            outcome,
            handshakes: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn handshake_count(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

impl AuthProvider for StaticAuthProvider {
    async fn authenticate(&self) -> Result<AuthIdentity, AuthError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_counts_calls() {
        let auth = Arc::new(StaticAuthProvider::new("u1", "Me@X.com"));

        let id = auth.authenticate().await.unwrap();
        assert_eq!(id.uid, Uid::new("u1"));
        assert_eq!(id.email, "Me@X.com");

        auth.sign_out().await.unwrap();
        assert_eq!(auth.handshake_count(), 1);
        assert_eq!(auth.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let auth = StaticAuthProvider::failing(AuthError::Cancelled);
        assert_eq!(auth.authenticate().await, Err(AuthError::Cancelled));
    }
}
