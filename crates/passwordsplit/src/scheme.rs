//! hybrid split/reconstruct scheme
//!
//! the password itself is never shared. a fresh aes-256 key encrypts it,
//! and only that key is cut into shamir shares:
//!
//! 1. key + nonce from the os csprng
//! 2. aes-256-gcm(password) → `encrypted_secret`, stored in every part
//! 3. shamir(key) → one share per part
//!
//! reconstruction interpolates the key and lets the gcm tag decide whether
//! the shares were right. wrong, foreign or tampered shares fail there.

use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::crypto::{self, SymmetricKey, NONCE_LEN};
use crate::error::{ReconstructError, SplitError};
use crate::shamir;

/// current part format: key split + aes-gcm encrypted secret
pub const FORMAT_VERSION: u32 = 2;

pub const MIN_THRESHOLD: u8 = 2;

pub const MAX_TOTAL_PARTS: u8 = 20;

/// in characters, not bytes
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// symmetric cipher protecting the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionMethod {
    #[serde(rename = "AES-GCM")]
    AesGcm,
}

/// metadata shared by every part of one split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeMetadata {
    pub scheme_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_parts: u8,
    pub threshold: u8,
    pub created_at: DateTime<Utc>,
    pub version: u32,
    #[serde(with = "crate::part::base64_bytes")]
    pub iv: Vec<u8>,
    #[serde(with = "crate::part::base64_bytes")]
    pub encrypted_secret: Vec<u8>,
    pub encryption_method: EncryptionMethod,
}

/// one distributable part: metadata + a single key share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub metadata: SchemeMetadata,
    /// shamir share of the encryption key
    #[serde(rename = "part", with = "crate::part::base64_bytes")]
    pub share: Vec<u8>,
    /// 1-indexed
    pub position: u8,
}

impl Part {
    /// `position` lies in `1..=total_parts`
    pub fn has_valid_position(&self) -> bool {
        (1..=self.metadata.total_parts).contains(&self.position)
    }
}

#[derive(Debug, Clone)]
pub struct SplitResult {
    pub parts: Vec<Part>,
}

/// outcome of a successful reconstruction
#[derive(Debug, Clone)]
pub struct Reconstructed {
    pub secret: String,
    pub metadata: SchemeMetadata,
}

fn validate_split_params(threshold: u8, total_parts: u8, description: Option<&str>) -> Result<(), SplitError> {
    if threshold < MIN_THRESHOLD {
        return Err(SplitError::ThresholdTooSmall { threshold, min: MIN_THRESHOLD });
    }
    if total_parts > MAX_TOTAL_PARTS {
        return Err(SplitError::TooManyParts { total_parts, max: MAX_TOTAL_PARTS });
    }
    if threshold > total_parts {
        return Err(SplitError::ThresholdExceedsTotal { threshold, total_parts });
    }
    if let Some(description) = description {
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(SplitError::DescriptionTooLong { len, max: MAX_DESCRIPTION_LEN });
        }
    }
    Ok(())
}

/// split a password into `total_parts` parts, any `threshold` of which
/// reconstruct it
///
/// requires `2 <= threshold <= total_parts <= 20` and a description of at
/// most 100 characters.
pub fn split(
    secret: &str,
    threshold: u8,
    total_parts: u8,
    description: Option<&str>,
) -> Result<SplitResult, SplitError> {
    validate_split_params(threshold, total_parts, description)?;

    let key = SymmetricKey::generate();
    let iv: [u8; NONCE_LEN] = crypto::random_bytes();

    let encrypted_secret = crypto::encrypt(&key, secret.as_bytes(), &iv)?;
    let shares = shamir::split(key.expose(), total_parts as usize, threshold as usize)?;
    drop(key);

    let metadata = SchemeMetadata {
        scheme_id: Uuid::new_v4().to_string(),
        description: description.map(str::to_owned),
        total_parts,
        threshold,
        created_at: Utc::now().trunc_subsecs(3),
        version: FORMAT_VERSION,
        iv: iv.to_vec(),
        encrypted_secret,
        encryption_method: EncryptionMethod::AesGcm,
    };

    debug!(
        scheme_id = %metadata.scheme_id,
        threshold,
        total_parts,
        "split secret"
    );

    let parts = shares
        .into_iter()
        .zip(1..=total_parts)
        .map(|(share, position)| Part {
            metadata: metadata.clone(),
            share,
            position,
        })
        .collect();

    Ok(SplitResult { parts })
}

/// reconstruct the password from at least `threshold` parts
///
/// threshold and scheme are taken from the first part. all parts must come
/// from the same split and have distinct positions; every supplied share
/// is used.
pub fn reconstruct(parts: &[Part]) -> Result<Reconstructed, ReconstructError> {
    let first = parts.first().ok_or(ReconstructError::NoParts)?;
    let metadata = &first.metadata;

    if parts.len() < metadata.threshold as usize {
        warn!(
            scheme_id = %metadata.scheme_id,
            need = metadata.threshold,
            got = parts.len(),
            "insufficient parts for reconstruction"
        );
        return Err(ReconstructError::InsufficientParts {
            need: metadata.threshold,
            got: parts.len(),
        });
    }

    if metadata.version != FORMAT_VERSION {
        return Err(ReconstructError::UnsupportedVersion(metadata.version));
    }

    let mut positions = HashSet::with_capacity(parts.len());
    for part in parts {
        if part.metadata.scheme_id != metadata.scheme_id {
            warn!(expected = %metadata.scheme_id, found = %part.metadata.scheme_id, "mixed schemes");
            return Err(ReconstructError::SchemeMismatch {
                expected: metadata.scheme_id.clone(),
                found: part.metadata.scheme_id.clone(),
            });
        }
        if !part.has_valid_position() {
            return Err(ReconstructError::InvalidPosition {
                position: part.position,
                total_parts: part.metadata.total_parts,
            });
        }
        if !positions.insert(part.position) {
            return Err(ReconstructError::DuplicatePosition(part.position));
        }
    }

    let secret = decrypt_with_parts(parts, metadata).map_err(|e| {
        warn!(scheme_id = %metadata.scheme_id, error = %e, "reconstruction failed");
        ReconstructError::Failed(e)
    })?;

    debug!(scheme_id = %metadata.scheme_id, parts = parts.len(), "reconstructed secret");

    Ok(Reconstructed {
        secret,
        metadata: metadata.clone(),
    })
}

/// combine shares into the key, then open the encrypted secret
fn decrypt_with_parts(parts: &[Part], metadata: &SchemeMetadata) -> Result<String, String> {
    let shares: Vec<Vec<u8>> = parts.iter().map(|p| p.share.clone()).collect();

    let key_bytes = shamir::combine(&shares).map_err(|e| e.to_string())?;
    let key = SymmetricKey::from_slice(&key_bytes).map_err(|e| e.to_string())?;
    drop(key_bytes);

    let plaintext = crypto::decrypt(&key, &metadata.encrypted_secret, &metadata.iv)
        .map_err(|e| e.to_string())?;
    drop(key);

    String::from_utf8(plaintext.to_vec()).map_err(|e| e.to_string())
}
