//! RS512 license tokens
//!
//! a license is a compact jws with an `RS512` header and
//! `{ "iss": "passwordsplit", "exp": <unix secs> }` claims. verification maps
//! every outcome to one of three error kinds:
//!
//! - `SIGNATURE_NOT_VALID`: well formed, but not signed by our key
//! - `EXPIRED`: signed by our key, `exp` missing or passed
//! - `VERIFICATION_EXCEPTION`: everything else (bad format, wrong alg, bad key)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    traits::PublicKeyParts,
    RsaPrivateKey, RsaPublicKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IssueError, LicenseError};

/// jws algorithm accepted for licenses
pub const LICENSE_ALGORITHM: Algorithm = Algorithm::RS512;

/// `iss` claim written by `LicenseIssuer`
pub const LICENSE_ISSUER: &str = "passwordsplit";

/// licenses closer than this to expiry are "expiring soon"
pub const EXPIRY_WARNING_SECS: i64 = 5 * 60;

/// public key of the production license issuer
pub const PRODUCTION_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEArQJ6y+MWzi+4m6UK6SHr
eh+4P9FHVqYrdgbGQSUjm7blN1xcEiKWcDP3qy/6nXles3fv5nEmiELSG0zyxmaO
2ovhsMomNhlcnV80F6+qSNvAqRSe3sNwr7IgLPdXCvdXV3RIgORcqoYXjbsbfM7/
QgvaGhMZRMwYAgZW1NUt+JIrpfRmG1AlGQoUEVM7fnmoMe9okUR4tfNmJ3Q1xGTn
56y9byXhS2Mj1L9ccfYrsSKB5kYw8ACGRjQKfAVEzn53VA8bQD035ZimnpN+6YUD
JdD3WB8uNr8K/579GAOffmD/puqcxlAi1zjiheubYniDPU5OM+w2KCIgnFWb5Alh
EwIDAQAB
-----END PUBLIC KEY-----
";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// a verified license
///
/// only `LicenseVerifier` creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseKey {
    key: String,
    expires_at: DateTime<Utc>,
    issuer: Option<String>,
}

impl LicenseKey {
    /// the raw token that was verified
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// time until expiry, `None` once expired
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<Duration> {
        let left = self.expires_at - now;
        (left > Duration::zero()).then_some(left)
    }

    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.time_left(now)
            .is_some_and(|left| left < Duration::seconds(EXPIRY_WARNING_SECS))
    }
}

/// render a remaining lifetime as `1h 2m 3s`, `2m 3s`, `3s` or `Expired`
pub fn format_time_left(left: Option<Duration>) -> String {
    let secs = match left {
        Some(d) if d.num_milliseconds() >= 1000 => d.num_seconds(),
        Some(d) if d > Duration::zero() => 0,
        _ => return "Expired".to_string(),
    };

    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// expiry is checked against the caller's clock, not by jsonwebtoken
fn license_validation() -> Validation {
    let mut validation = Validation::new(LICENSE_ALGORITHM);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// verifies license tokens against one issuer public key
pub struct LicenseVerifier {
    decoding_key: DecodingKey,
}

impl LicenseVerifier {
    pub fn new(public_key: &RsaPublicKey) -> Self {
        Self {
            decoding_key: DecodingKey::from_rsa_raw_components(
                &public_key.n().to_bytes_be(),
                &public_key.e().to_bytes_be(),
            ),
        }
    }

    /// parse an spki (`BEGIN PUBLIC KEY`) or pkcs#1 (`BEGIN RSA PUBLIC KEY`) pem
    pub fn from_public_key_pem(pem: &str) -> Result<Self, LicenseError> {
        let public_key = RsaPublicKey::from_public_key_pem(pem.trim())
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem.trim()))
            .map_err(|e| LicenseError::exception(format!("invalid public key: {}", e)))?;
        Ok(Self::new(&public_key))
    }

    /// verifier for the production issuer key
    pub fn production() -> Result<Self, LicenseError> {
        Self::from_public_key_pem(PRODUCTION_PUBLIC_KEY_PEM)
    }

    /// verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<LicenseKey, LicenseError> {
        self.verify_at(token, Utc::now())
    }

    /// verify a token as of `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<LicenseKey, LicenseError> {
        let result = self.check(token.trim(), now);
        match &result {
            Ok(license) => debug!(expires_at = %license.expires_at, "license verified"),
            Err(e) => warn!(kind = %e.kind(), error = %e, "license rejected"),
        }
        result
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<LicenseKey, LicenseError> {
        // header and claims must be well-formed json before the signature
        // decides anything, so a garbled token is never SIGNATURE_NOT_VALID
        let mut structure = license_validation();
        structure.insecure_disable_signature_validation();
        decode::<serde_json::Value>(token, &self.decoding_key, &structure)
            .map_err(LicenseError::exception)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &license_validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => LicenseError::SignatureNotValid,
                _ => LicenseError::exception(e),
            })?
            .claims;

        let Some(exp) = claims.exp else {
            return Err(LicenseError::Expired { expired_at: None });
        };
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| LicenseError::exception(format!("exp out of range: {}", exp)))?;

        if now.timestamp() >= exp {
            return Err(LicenseError::Expired {
                expired_at: Some(expires_at),
            });
        }

        Ok(LicenseKey {
            key: token.to_string(),
            expires_at,
            issuer: claims.iss,
        })
    }
}

impl std::fmt::Debug for LicenseVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LicenseVerifier(RS512)")
    }
}

/// verify `token` with `public_key_pem`, or the production key when `None`
pub fn verify_license_key(token: &str, public_key_pem: Option<&str>) -> Result<LicenseKey, LicenseError> {
    let verifier = match public_key_pem {
        Some(pem) => LicenseVerifier::from_public_key_pem(pem)?,
        None => LicenseVerifier::production()?,
    };
    verifier.verify(token)
}

/// signs license tokens (server side)
pub struct LicenseIssuer {
    encoding_key: EncodingKey,
    issuer: String,
}

impl LicenseIssuer {
    pub fn new(private_key: &RsaPrivateKey) -> Result<Self, IssueError> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| IssueError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self {
            encoding_key: EncodingKey::from_rsa_der(der.as_bytes()),
            issuer: LICENSE_ISSUER.to_string(),
        })
    }

    /// parse a pkcs#8 (`BEGIN PRIVATE KEY`) or pkcs#1 (`BEGIN RSA PRIVATE KEY`) pem
    pub fn from_private_key_pem(pem: &str) -> Result<Self, IssueError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem.trim())
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem.trim()))
            .map_err(|e| IssueError::InvalidPrivateKey(e.to_string()))?;
        Self::new(&private_key)
    }

    /// override the `iss` claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// issue a license valid for `ttl` from now
    pub fn issue(&self, ttl: Duration) -> Result<String, IssueError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(IssueError::ExpirationOutOfRange)?;
        self.issue_until(expires_at)
    }

    /// issue a license expiring at `expires_at` (second precision)
    pub fn issue_until(&self, expires_at: DateTime<Utc>) -> Result<String, IssueError> {
        let claims = Claims {
            iss: Some(self.issuer.clone()),
            exp: Some(expires_at.timestamp()),
        };

        let token = encode(&Header::new(LICENSE_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| IssueError::Signing(e.to_string()))?;

        debug!(exp = expires_at.timestamp(), "issued license");
        Ok(token)
    }
}
