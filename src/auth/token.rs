//! HS256 bearer tokens.
//!
//! Tokens use the JWS compact form `header.claims.signature`, each segment
//! base64url without padding. The MAC key is injected at construction and never
//! read from ambient state. Tokens are stateless: nothing is persisted on issue
//! and there is no revocation, so a token stays valid until `exp`.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::{fmt, time::SystemTime};

use super::{
    error::AuthError,
    identity::{Identity, UserId},
};

type HmacSha256 = Hmac<Sha256>;

/// Fixed token lifetime: 24 hours.
pub const TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

const ALG_HS256: &str = "HS256";

/// Largest integer an IEEE-754 double represents exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Decoded and validated token payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.username.clone())
    }
}

/// Wire shape of the claims segment. Numeric fields stay untyped until
/// [`coerce_unsigned`] has looked at them.
#[derive(Deserialize)]
struct RawClaims {
    user_id: Value,
    username: String,
    #[serde(default)]
    iat: Option<Value>,
    exp: Value,
}

impl RawClaims {
    fn into_claims(self) -> Result<Claims, AuthError> {
        let user_id = coerce_unsigned(&self.user_id).ok_or(AuthError::InvalidToken)?;
        let exp = coerce_unsigned(&self.exp).ok_or(AuthError::InvalidToken)?;
        let iat = match &self.iat {
            Some(value) => coerce_unsigned(value).ok_or(AuthError::InvalidToken)?,
            None => exp.saturating_sub(TOKEN_TTL_SECONDS),
        };

        Ok(Claims {
            user_id: UserId::new(user_id),
            username: self.username,
            iat,
            exp,
        })
    }
}

/// Coerce a loosely typed JSON number into a non-negative integer.
///
/// Integers are taken as-is when non-negative. Floats are accepted only when
/// finite, integral, non-negative and exactly representable (`<= 2^53`), which
/// covers issuers that encode every number as a double. Everything else,
/// strings included, is rejected.
pub(crate) fn coerce_unsigned(value: &Value) -> Option<u64> {
    let Value::Number(number) = value else {
        return None;
    };

    if let Some(unsigned) = number.as_u64() {
        return Some(unsigned);
    }

    if number.is_i64() {
        // as_u64 already failed, so this is negative
        return None;
    }

    let float = number.as_f64()?;
    if !float.is_finite() || float < 0.0 || float.fract() != 0.0 || float > MAX_EXACT_FLOAT_INT {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let unsigned = float as u64;
    Some(unsigned)
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn build_mac(secret: &SecretString) -> Result<HmacSha256, AuthError> {
    let key = secret.expose_secret();
    if key.is_empty() {
        return Err(AuthError::internal("token signing secret must not be empty"));
    }
    HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|err| AuthError::internal(format!("invalid token signing key: {err}")))
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value)
        .map_err(|err| AuthError::internal(format!("failed to encode token segment: {err}")))?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

/// Mints signed tokens. Issuance is pure computation; no store access.
#[derive(Clone)]
pub struct TokenIssuer {
    mac: HmacSha256,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// # Errors
    /// Returns `AuthError::Internal` if the secret is empty.
    pub fn new(secret: &SecretString) -> Result<Self, AuthError> {
        Ok(Self {
            mac: build_mac(secret)?,
        })
    }

    /// Issue a token for `identity`, valid for [`TOKEN_TTL_SECONDS`] from now.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if the claims cannot be serialized.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, now_unix_seconds())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if the claims cannot be serialized.
    pub fn issue_at(&self, identity: &Identity, now: u64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: identity.user_id(),
            username: identity.username().to_string(),
            iat: now,
            exp: now.saturating_add(TOKEN_TTL_SECONDS),
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }
}

/// Validates tokens minted by a [`TokenIssuer`] holding the same secret.
#[derive(Clone)]
pub struct TokenVerifier {
    mac: HmacSha256,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// # Errors
    /// Returns `AuthError::Internal` if the secret is empty.
    pub fn new(secret: &SecretString) -> Result<Self, AuthError> {
        Ok(Self {
            mac: build_mac(secret)?,
        })
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// `InvalidToken` for any structural or signature failure, `ExpiredToken`
    /// when the token is authentic but `now >= exp`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, now_unix_seconds())
    }

    /// Verify a token as if the current time were `now` (unix seconds).
    ///
    /// # Errors
    /// See [`TokenVerifier::verify`].
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
        let claims_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
        let signature_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
        if parts.next().is_some() {
            return Err(AuthError::InvalidToken);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != ALG_HS256 {
            return Err(AuthError::InvalidToken);
        }

        let signature =
            Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let raw: RawClaims = b64d_json(claims_b64)?;
        let claims = raw.into_claims()?;

        if now >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: u64 = 1_700_000_000;
    const MINUTE: u64 = 60;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn pair() -> Result<(TokenIssuer, TokenVerifier), AuthError> {
        let key = secret("test-signing-secret");
        Ok((TokenIssuer::new(&key)?, TokenVerifier::new(&key)?))
    }

    fn bob() -> Identity {
        Identity::new(UserId::new(42), "bob")
    }

    /// Sign arbitrary header/claims JSON with the test key, bypassing `Claims`.
    fn sign_raw(header: &Value, claims: &Value) -> Result<String, AuthError> {
        let header_b64 = Base64UrlUnpadded::encode_string(header.to_string().as_bytes());
        let claims_b64 = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = build_mac(&secret("test-signing-secret"))?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    fn hs256_header() -> Value {
        json!({"alg": "HS256", "typ": "JWT"})
    }

    #[test]
    fn round_trip_recovers_identity() -> Result<(), AuthError> {
        let (issuer, verifier) = pair()?;
        let token = issuer.issue(&bob())?;
        let claims = verifier.verify(&token)?;
        assert_eq!(claims.user_id, UserId::new(42));
        assert_eq!(claims.username, "bob");
        assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECONDS);
        assert_eq!(claims.identity(), bob());
        Ok(())
    }

    #[test]
    fn token_has_three_segments() -> Result<(), AuthError> {
        let (issuer, _) = pair()?;
        let token = issuer.issue_at(&bob(), NOW)?;
        assert_eq!(token.split('.').count(), 3);
        Ok(())
    }

    #[test]
    fn issuance_differs_one_second_apart() -> Result<(), AuthError> {
        let (issuer, _) = pair()?;
        assert_eq!(issuer.issue_at(&bob(), NOW)?, issuer.issue_at(&bob(), NOW)?);
        assert_ne!(
            issuer.issue_at(&bob(), NOW)?,
            issuer.issue_at(&bob(), NOW + 1)?
        );
        Ok(())
    }

    #[test]
    fn valid_until_just_before_expiry() -> Result<(), AuthError> {
        let (issuer, verifier) = pair()?;
        let token = issuer.issue_at(&bob(), NOW)?;

        let almost = NOW + 23 * 60 * MINUTE + 59 * MINUTE;
        assert_eq!(verifier.verify_at(&token, almost)?.user_id, UserId::new(42));

        let after = NOW + 24 * 60 * MINUTE + MINUTE;
        assert_eq!(
            verifier.verify_at(&token, after),
            Err(AuthError::ExpiredToken)
        );

        // exp itself is already expired
        assert_eq!(
            verifier.verify_at(&token, NOW + TOKEN_TTL_SECONDS),
            Err(AuthError::ExpiredToken)
        );
        Ok(())
    }

    #[test]
    fn flipping_any_signature_bit_is_invalid() -> Result<(), AuthError> {
        let (issuer, verifier) = pair()?;
        let token = issuer.issue_at(&bob(), NOW)?;
        let (signing_input, signature_b64) = token
            .rsplit_once('.')
            .ok_or_else(|| AuthError::internal("token without signature"))?;
        let signature = Base64UrlUnpadded::decode_vec(signature_b64)
            .map_err(|_| AuthError::internal("signature not base64url"))?;

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!(
                    "{signing_input}.{}",
                    Base64UrlUnpadded::encode_string(&tampered)
                );
                assert_eq!(
                    verifier.verify_at(&forged, NOW),
                    Err(AuthError::InvalidToken),
                    "byte {byte} bit {bit}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn tampered_claims_are_invalid() -> Result<(), AuthError> {
        let (issuer, verifier) = pair()?;
        let token = issuer.issue_at(&bob(), NOW)?;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Base64UrlUnpadded::encode_string(
            json!({"user_id": 1, "username": "bob", "iat": NOW, "exp": NOW + TOKEN_TTL_SECONDS})
                .to_string()
                .as_bytes(),
        );
        parts[1] = &forged_claims;
        assert_eq!(
            verifier.verify_at(&parts.join("."), NOW),
            Err(AuthError::InvalidToken)
        );
        Ok(())
    }

    #[test]
    fn expired_and_tampered_reports_invalid() -> Result<(), AuthError> {
        let (issuer, verifier) = pair()?;
        let token = issuer.issue_at(&bob(), NOW)?;
        let forged = format!("{token}x");
        assert_eq!(
            verifier.verify_at(&forged, NOW + 2 * TOKEN_TTL_SECONDS),
            Err(AuthError::InvalidToken)
        );
        Ok(())
    }

    #[test]
    fn other_secret_is_invalid() -> Result<(), AuthError> {
        let (issuer, _) = pair()?;
        let stranger = TokenVerifier::new(&secret("another-secret"))?;
        let token = issuer.issue_at(&bob(), NOW)?;
        assert_eq!(stranger.verify_at(&token, NOW), Err(AuthError::InvalidToken));
        Ok(())
    }

    #[test]
    fn malformed_tokens_are_invalid() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        for token in ["", "abc", "a.b", "a.b.c", "a.b.c.d", "..", "!!!.###.$$$"] {
            assert_eq!(
                verifier.verify_at(token, NOW),
                Err(AuthError::InvalidToken),
                "{token:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn other_algorithms_are_rejected() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        let claims = json!({"user_id": 42, "username": "bob", "exp": NOW + 60});
        for alg in ["none", "HS512", "RS256"] {
            let token = sign_raw(&json!({"alg": alg, "typ": "JWT"}), &claims)?;
            assert_eq!(
                verifier.verify_at(&token, NOW),
                Err(AuthError::InvalidToken)
            );
        }
        Ok(())
    }

    #[test]
    fn header_without_typ_is_accepted() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        let token = sign_raw(
            &json!({"alg": "HS256"}),
            &json!({"user_id": 42, "username": "bob", "exp": NOW + 60}),
        )?;
        assert_eq!(verifier.verify_at(&token, NOW)?.user_id, UserId::new(42));
        Ok(())
    }

    #[test]
    fn float_encoded_user_id_is_accepted() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        let token = sign_raw(
            &hs256_header(),
            &json!({"user_id": 42.0, "username": "bob", "exp": 1_700_086_400.0}),
        )?;
        let claims = verifier.verify_at(&token, NOW)?;
        assert_eq!(claims.user_id, UserId::new(42));
        assert_eq!(claims.exp, 1_700_086_400);
        assert_eq!(claims.iat, 1_700_086_400 - TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn non_integral_user_ids_are_rejected() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        for user_id in [
            json!(-1),
            json!(-1.0),
            json!(4.5),
            json!("42"),
            json!(null),
            json!(true),
            json!([42]),
            json!(1e300),
        ] {
            let token = sign_raw(
                &hs256_header(),
                &json!({"user_id": user_id, "username": "bob", "exp": NOW + 60}),
            )?;
            assert_eq!(
                verifier.verify_at(&token, NOW),
                Err(AuthError::InvalidToken),
                "user_id {user_id}"
            );
        }
        Ok(())
    }

    #[test]
    fn missing_claims_are_rejected() -> Result<(), AuthError> {
        let (_, verifier) = pair()?;
        for claims in [
            json!({"username": "bob", "exp": NOW + 60}),
            json!({"user_id": 42, "exp": NOW + 60}),
            json!({"user_id": 42, "username": "bob"}),
        ] {
            let token = sign_raw(&hs256_header(), &claims)?;
            assert_eq!(
                verifier.verify_at(&token, NOW),
                Err(AuthError::InvalidToken)
            );
        }
        Ok(())
    }

    #[test]
    fn coerce_unsigned_cases() {
        assert_eq!(coerce_unsigned(&json!(0)), Some(0));
        assert_eq!(coerce_unsigned(&json!(u64::MAX)), Some(u64::MAX));
        assert_eq!(coerce_unsigned(&json!(7.0)), Some(7));
        assert_eq!(
            coerce_unsigned(&json!(9_007_199_254_740_992.0)),
            Some(9_007_199_254_740_992)
        );
        assert_eq!(coerce_unsigned(&json!(-0.5)), None);
        assert_eq!(coerce_unsigned(&json!(i64::MIN)), None);
        assert_eq!(coerce_unsigned(&json!("7")), None);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new(&secret("")),
            Err(AuthError::Internal(_))
        ));
        assert!(matches!(
            TokenVerifier::new(&secret("")),
            Err(AuthError::Internal(_))
        ));
    }
}
