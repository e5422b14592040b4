//! error types for passwordsplit
//!
//! every fallible operation returns a typed error. expected failures
//! (too few parts, expired license, ...) are values, never panics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// low-level crypto faults (aead, shamir, randomness)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid nonce length: expected 12 bytes, got {0}")]
    InvalidNonceLength(usize),

    #[error("secret sharing failed: {0}")]
    Sharing(String),
}

/// failures of `split` and of the split gate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("threshold must be at least {min}, got {threshold}")]
    ThresholdTooSmall { threshold: u8, min: u8 },

    #[error("threshold {threshold} exceeds total parts {total_parts}")]
    ThresholdExceedsTotal { threshold: u8, total_parts: u8 },

    #[error("total parts must be at most {max}, got {total_parts}")]
    TooManyParts { total_parts: u8, max: u8 },

    #[error("description must be at most {max} characters, got {len}")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("a valid license is required to split custom passwords")]
    LicenseRequired,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// failures of `reconstruct`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("No parts provided")]
    NoParts,

    #[error("Insufficient parts: need {need}, got {got}")]
    InsufficientParts { need: u8, got: usize },

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Parts belong to different schemes: expected {expected}, found {found}")]
    SchemeMismatch { expected: String, found: String },

    #[error("Duplicate part position: {0}")]
    DuplicatePosition(u8),

    #[error("Invalid part position: {position} is outside 1..={total_parts}")]
    InvalidPosition { position: u8, total_parts: u8 },

    #[error("Failed to reconstruct password: {0}")]
    Failed(String),
}

/// failures decoding a transported part
#[derive(Debug, Error)]
pub enum PartFormatError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid part structure: {0}")]
    Json(#[from] serde_json::Error),
}

/// failures adding a part to a `PartCollector`
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Invalid part format: {0}")]
    InvalidFormat(#[from] PartFormatError),

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    #[error("This part belongs to a different scheme. All parts must be from the same password split.")]
    DifferentScheme,

    #[error("This part position has already been added.")]
    DuplicatePosition(u8),

    #[error("Invalid part position: {position} is outside 1..={total_parts}")]
    InvalidPosition { position: u8, total_parts: u8 },
}

/// machine-readable license failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseErrorKind {
    Expired,
    SignatureNotValid,
    VerificationException,
}

impl LicenseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseErrorKind::Expired => "EXPIRED",
            LicenseErrorKind::SignatureNotValid => "SIGNATURE_NOT_VALID",
            LicenseErrorKind::VerificationException => "VERIFICATION_EXCEPTION",
        }
    }
}

impl std::fmt::Display for LicenseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// failures of license verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// signature valid, but `exp` is missing or in the past
    #[error("license expired")]
    Expired { expired_at: Option<DateTime<Utc>> },

    #[error("license signature not valid")]
    SignatureNotValid,

    /// malformed token, wrong algorithm, bad key or any other fault
    #[error("license verification failed: {0}")]
    VerificationException(String),
}

impl LicenseError {
    pub fn kind(&self) -> LicenseErrorKind {
        match self {
            LicenseError::Expired { .. } => LicenseErrorKind::Expired,
            LicenseError::SignatureNotValid => LicenseErrorKind::SignatureNotValid,
            LicenseError::VerificationException(_) => LicenseErrorKind::VerificationException,
        }
    }

    pub(crate) fn exception(detail: impl std::fmt::Display) -> Self {
        LicenseError::VerificationException(detail.to_string())
    }
}

/// failures issuing a license token
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("expiration is out of range")]
    ExpirationOutOfRange,

    #[error("signing failed: {0}")]
    Signing(String),
}
