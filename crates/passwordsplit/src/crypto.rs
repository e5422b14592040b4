//! cryptographic primitives for passwordsplit
//!
//! - aes-256-gcm for authenticated encryption of the secret
//! - os csprng for keys, nonces and share coordinates

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// aes-256 key length
pub const KEY_LEN: usize = 32;

/// aes-gcm nonce length (96 bits)
pub const NONCE_LEN: usize = 12;

/// symmetric key that is wiped when dropped
pub struct SymmetricKey(Zeroizing<[u8; KEY_LEN]>);

impl SymmetricKey {
    /// fresh random key from the os csprng
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(key.as_mut());
        Self(key)
    }

    /// import raw key bytes (e.g. recovered from shares)
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// raw key bytes
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// generate random bytes
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// encrypt using aes-256-gcm, returns ciphertext || tag
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|_| CryptoError::InvalidKeyLength(KEY_LEN))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// decrypt ciphertext || tag using aes-256-gcm
///
/// the plaintext comes back in a zeroizing buffer since it is the user's secret.
pub fn decrypt(key: &SymmetricKey, ciphertext: &[u8], nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidNonceLength(nonce.len()));
    }
    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|_| CryptoError::InvalidKeyLength(KEY_LEN))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}
