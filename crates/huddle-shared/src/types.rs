use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::KDF_CONTEXT_THREAD_ID;
use crate::error::ValidationError;

/// Opaque identity assigned by the authentication provider.
///
/// The owner's `Uid` doubles as the workspace partition key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and lower-case an email address for comparison.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A normalized, non-empty email address.
///
/// Every comparison between emails (invite lists, thread participants,
/// handshake results) goes through this type, so two `Email`s are equal
/// exactly when their normalized forms are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_email(raw);
        if normalized.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Identifier of a two-party thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ThreadId(pub Uuid);

impl ThreadId {
    /// Derive the identifier for a workspace and an unordered pair of
    /// participants. Swapping `a` and `b` yields the same id.
    pub fn for_pair(workspace: &Uid, a: &Email, b: &Email) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_THREAD_ID);
        hasher.update(workspace.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(low.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(high.as_str().as_bytes());
        let hash = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash.as_bytes()[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        assert_eq!(email("  Bob@X.com ").as_str(), "bob@x.com");
        assert_eq!(email("Bob@X.com "), email("bob@x.com"));
    }

    #[test]
    fn test_empty_email_rejected() {
        assert_eq!(Email::parse(""), Err(ValidationError::EmptyEmail));
        assert_eq!(Email::parse("   \t"), Err(ValidationError::EmptyEmail));
    }

    #[test]
    fn test_email_deserialize_normalizes() {
        let parsed: Email = serde_json::from_str("\" Agent@X.COM\"").unwrap();
        assert_eq!(parsed.as_str(), "agent@x.com");
        assert!(serde_json::from_str::<Email>("\"  \"").is_err());
    }

    #[test]
    fn test_thread_id_ignores_pair_order() {
        let ws = Uid::new("owner-1");
        let a = email("owner@x.com");
        let b = email("agent@x.com");
        assert_eq!(ThreadId::for_pair(&ws, &a, &b), ThreadId::for_pair(&ws, &b, &a));
    }

    #[test]
    fn test_thread_id_scoped_to_workspace() {
        let a = email("owner@x.com");
        let b = email("agent@x.com");
        assert_ne!(
            ThreadId::for_pair(&Uid::new("ws-1"), &a, &b),
            ThreadId::for_pair(&Uid::new("ws-2"), &a, &b)
        );
    }

    #[test]
    fn test_thread_id_display_parse() {
        let id = ThreadId::for_pair(&Uid::new("ws"), &email("a@x.com"), &email("b@x.com"));
        assert_eq!(ThreadId::parse(&id.to_string()).unwrap(), id);
    }
}
