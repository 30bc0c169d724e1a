//! Short-lived JWT issuance for Kling API authentication.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use super::client::KlingError;

/// Token validity window (30 minutes).
pub const TOKEN_TTL_SECS: u64 = 1800;

/// Negative valid-from offset to tolerate clock skew (5 seconds).
pub const TOKEN_NOT_BEFORE_SKEW_SECS: u64 = 5;

/// JWT claims expected by the Kling API.
#[derive(Debug, Serialize)]
struct Claims<'a> {
    /// Issuer: the access key.
    iss: &'a str,
    /// Expiry: now + 30 minutes.
    exp: u64,
    /// Not-before: now - 5 seconds.
    nbf: u64,
}

/// Sign a fresh HS256 bearer token from the key pair.
///
/// A new token is issued for every API call; tokens are never cached or
/// reused. A signing failure is fatal to the enclosing call.
pub fn issue_token(access_key: &str, secret_key: &str) -> Result<String, KlingError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let claims = Claims {
        iss: access_key,
        exp: now + TOKEN_TTL_SECS,
        nbf: now.saturating_sub(TOKEN_NOT_BEFORE_SKEW_SECS),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct DecodedClaims {
        iss: String,
        exp: u64,
        nbf: u64,
    }

    #[test]
    fn test_issue_token_produces_three_segments() {
        let token = issue_token("ak", "sk").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_issue_token_uses_hs256() {
        let token = issue_token("ak", "sk").unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_issue_token_claims() {
        let token = issue_token("my-access-key", "my-secret-key").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        let decoded = decode::<DecodedClaims>(
            &token,
            &DecodingKey::from_secret(b"my-secret-key"),
            &validation,
        )
        .unwrap();

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        assert_eq!(decoded.claims.iss, "my-access-key");
        // exp lands 30 minutes out, nbf a few seconds in the past
        assert!(decoded.claims.exp >= now + TOKEN_TTL_SECS - 2);
        assert!(decoded.claims.exp <= now + TOKEN_TTL_SECS + 2);
        assert!(decoded.claims.nbf <= now);
        assert!(decoded.claims.nbf >= now - TOKEN_NOT_BEFORE_SKEW_SECS - 2);
    }

    #[test]
    fn test_issue_token_fresh_per_call() {
        // Tokens from different key pairs must differ; same-pair tokens are
        // regenerated rather than cached (identical only if issued within the
        // same second, which is fine for this check).
        let a = issue_token("ak1", "sk").unwrap();
        let b = issue_token("ak2", "sk").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_issue_token_rejects_wrong_secret_on_decode() {
        let token = issue_token("ak", "right-secret").unwrap();
        let validation = Validation::new(Algorithm::HS256);
        let result = decode::<DecodedClaims>(
            &token,
            &DecodingKey::from_secret(b"wrong-secret"),
            &validation,
        );
        assert!(result.is_err());
    }
}
