//! Signed, time-limited bearer tokens.
//!
//! Tokens use the compact JWS layout with HMAC-SHA256 (`HS256`):
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(hmac_sha256(key, header "." claims))
//! ```
//!
//! The subject is the account email. Signature checks use `Mac::verify_slice`,
//! which compares in constant time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

const HEADER_ALG: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account email.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly minted token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct SigningKey(Vec<u8>);

/// Mints and verifies bearer tokens with a shared secret.
pub struct TokenSigner {
    key: SigningKey,
}

impl TokenSigner {
    /// Create a signer. The secret must be at least [`MIN_SECRET_BYTES`] long.
    pub fn new(secret: &[u8]) -> CryptoResult<Self> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(CryptoError::WeakSecret(MIN_SECRET_BYTES));
        }
        Ok(Self {
            key: SigningKey(secret.to_vec()),
        })
    }

    fn mac(&self) -> CryptoResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.key.0)
            .map_err(|e| CryptoError::InvalidToken(format!("signing key: {}", e)))
    }

    /// Mint a token for `subject`, valid for `ttl` from `issued_at`.
    pub fn issue(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> CryptoResult<IssuedToken> {
        let expires_at = issued_at + ttl;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let header = Header {
            alg: HEADER_ALG.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", signing_input, signature),
            expires_at,
        })
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> CryptoResult<TokenClaims> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, sig_b64) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s)) if parts.next().is_none() => (h, c, s),
            _ => return Err(CryptoError::InvalidToken("expected three segments".into())),
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|e| CryptoError::InvalidToken(format!("header encoding: {}", e)))?;
        let header: Header = serde_json::from_slice(&header_bytes)
            .map_err(|e| CryptoError::InvalidToken(format!("header: {}", e)))?;
        if header.alg != HEADER_ALG {
            return Err(CryptoError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|e| CryptoError::InvalidToken(format!("signature encoding: {}", e)))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CryptoError::InvalidToken("signature mismatch".into()))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|e| CryptoError::InvalidToken(format!("claims encoding: {}", e)))?;
        let claims: TokenClaims = serde_json::from_slice(&claims_bytes)
            .map_err(|e| CryptoError::InvalidToken(format!("claims: {}", e)))?;

        if now.timestamp() >= claims.exp {
            return Err(CryptoError::TokenExpired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
