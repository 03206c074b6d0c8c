//! Authentication types for bearer credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Claims consumed from a verified bearer credential.
///
/// Only `sub` is used as the caller identity. `exp` and `nbf` are checked by
/// the verifier and otherwise ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller identity).
    pub sub: String,
    /// Expiration timestamp.
    pub exp: i64,
    /// Not-before timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Issued at timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Identity of an authenticated caller.
///
/// This is the tenancy partition: every storage key a caller can reach is
/// rooted at `uploads/{identity}/`. An identity is never empty, never `.` or
/// `..`, and never contains a separator, so it always occupies exactly one
/// key segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Builds an identity from a subject claim.
    ///
    /// Returns `None` if the subject is empty, a relative path component
    /// (`.` or `..`), or contains a path separator.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Option<Self> {
        let subject = subject.into();
        if matches!(subject.as_str(), "" | "." | "..") || subject.contains(['/', '\\']) {
            return None;
        }
        Some(Self(subject))
    }

    /// Returns the subject string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallerIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_caller_identity_keeps_subject() {
        let identity = CallerIdentity::new("user-42").expect("valid subject");
        assert_eq!(identity.as_str(), "user-42");
        assert_eq!(identity.to_string(), "user-42");
    }

    #[rstest]
    #[case("")]
    #[case("u1/../u2")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case(".")]
    #[case("..")]
    fn test_caller_identity_rejects_unsafe_subjects(#[case] subject: &str) {
        assert!(CallerIdentity::new(subject).is_none());
    }

    #[rstest]
    #[case("...")]
    #[case("..u1")]
    #[case("u1.png")]
    fn test_caller_identity_accepts_dotted_subjects(#[case] subject: &str) {
        assert_eq!(CallerIdentity::new(subject).unwrap().as_str(), subject);
    }
}
