use huddle_shared::{Email, ValidationError};
use huddle_store::StoreError;
use thiserror::Error;

/// Failures of the external authentication handshake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Sign-in was cancelled")]
    Cancelled,

    #[error("Sign-in failed: {0}")]
    Failed(String),
}

/// Everything a login, thread switch or send can fail with.
///
/// All variants are recoverable by restarting the flow that produced them.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0} has not been invited to any workspace")]
    NotInvited(Email),

    #[error("Signed in as {actual}, but {claimed} was claimed")]
    IdentityMismatch { claimed: Email, actual: String },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
