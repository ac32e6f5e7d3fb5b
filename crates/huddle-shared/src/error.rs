use thiserror::Error;

use crate::types::Email;

/// Missing or malformed caller input. Surfaced immediately, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email address is required")]
    EmptyEmail,

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Message too long: {len} bytes (max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("A thread needs two distinct participants")]
    SameParticipants,

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("No conversation is selected")]
    NoActiveThread,

    #[error("{0} is not one of your contacts")]
    NotAContact(Email),
}
