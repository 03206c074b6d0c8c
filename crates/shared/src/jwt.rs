//! Bearer credential verification.
//!
//! Credentials are minted by an external identity provider and signed with a
//! shared HMAC secret. This module only verifies them; it never issues tokens.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use thiserror::Error;

use crate::auth::{CallerIdentity, Claims};

/// Signing algorithms accepted for bearer credentials.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT verification configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret the credentials are signed with.
    pub secret: String,
    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: crate::config::DEVELOPMENT_SECRET.to_string(),
            leeway_secs: 0,
        }
    }
}

/// Errors that can occur while verifying a bearer credential.
///
/// Every variant maps to `AppError::Unauthenticated`; the distinction only
/// exists for logging.
#[derive(Debug, Error)]
pub enum JwtError {
    /// No `Authorization` header was sent.
    #[error("authorization header missing")]
    MissingCredential,

    /// The header is not of the form `Bearer <token>`.
    #[error("authorization header is not a bearer credential")]
    MalformedHeader,

    /// The token is signed with something other than an HMAC algorithm.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is not valid yet.
    #[error("token is not valid yet")]
    NotYetValid,

    /// Signature does not match the configured secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Required claims are missing or have the wrong type.
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// Token could not be decoded.
    #[error("failed to decode token: {0}")]
    DecodingError(String),
}

/// Verifies bearer credentials and extracts the caller identity.
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("decoding_key", &"[hidden]")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtService {
    /// Creates a new verifier with the given configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Only `sub` is consumed; issuers may add any audience.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verifies a raw `Authorization` header value and returns the caller.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::MissingCredential` if the header is absent,
    /// `JwtError::MalformedHeader` if it is not a bearer credential, and any
    /// error from [`Self::validate_token`] otherwise.
    pub fn verify_authorization(&self, header: Option<&str>) -> Result<CallerIdentity, JwtError> {
        let header = header.ok_or(JwtError::MissingCredential)?;
        let token = extract_bearer_token(header).ok_or(JwtError::MalformedHeader)?;
        let claims = self.validate_token(token)?;

        CallerIdentity::new(claims.sub)
            .ok_or_else(|| JwtError::InvalidClaims("subject is not a usable identity".to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// The header algorithm is checked before the signature or claims are
    /// looked at, so tokens signed with an asymmetric or `none` algorithm are
    /// refused outright.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::UnsupportedAlgorithm` for non-HMAC tokens,
    /// `JwtError::Expired` / `JwtError::NotYetValid` for time window failures,
    /// `JwtError::InvalidSignature` for a bad signature and
    /// `JwtError::InvalidClaims` if `sub` is missing or not a string.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::DecodingError(e.to_string()))?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(JwtError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    ErrorKind::ImmatureSignature => JwtError::NotYetValid,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    ErrorKind::InvalidAlgorithm => {
                        JwtError::UnsupportedAlgorithm(format!("{:?}", header.alg))
                    }
                    ErrorKind::MissingRequiredClaim(claim) => {
                        JwtError::InvalidClaims(format!("missing claim `{claim}`"))
                    }
                    ErrorKind::Json(inner) => JwtError::InvalidClaims(inner.to_string()),
                    _ => JwtError::DecodingError(e.to_string()),
                }
            })
    }
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; anything other than exactly one
/// scheme and one token is rejected.
fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("bearer abc.def.ghi", Some("abc.def.ghi"))]
    #[case("Basic dXNlcjpwYXNz", None)]
    #[case("Bearer", None)]
    #[case("Bearer ", None)]
    #[case("Bearer a b", None)]
    #[case("abc.def.ghi", None)]
    fn test_extract_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_bearer_token(header), expected);
    }

    #[test]
    fn test_missing_header() {
        let service = JwtService::new(&JwtConfig::default());
        let result = service.verify_authorization(None);
        assert!(matches!(result, Err(JwtError::MissingCredential)));
    }

    #[test]
    fn test_garbled_token() {
        let service = JwtService::new(&JwtConfig::default());
        let result = service.validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let service = JwtService::new(&JwtConfig::default());
        let rendered = format!("{service:?}");
        assert!(rendered.contains("[hidden]"));
        assert!(!rendered.contains(crate::config::DEVELOPMENT_SECRET));
    }
}
