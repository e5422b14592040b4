//! # passwordsplit
//!
//! split a password into shares so that any `t` of `n` recover it, and
//! verify the signed licenses that unlock splitting custom passwords.
//!
//! ## scheme (format version 2)
//!
//! ```text
//!        password
//!           │ aes-256-gcm (random key, random 96-bit iv)
//!           ▼
//!   ┌────────────────┐        ┌───────────┐
//!   │encrypted secret│        │  aes key  │
//!   └───────┬────────┘        └─────┬─────┘
//!           │                       │ shamir, t-of-n over GF(256)
//!           │               ┌───────┼───────┐
//!           ▼               ▼       ▼       ▼
//!     copied into    ┌──────┐ ┌──────┐ ┌──────┐
//!     every part ──► │part 1│ │part 2│ │part n│
//!                    └──────┘ └──────┘ └──────┘
//! ```
//!
//! each part carries the shared metadata (scheme id, threshold, iv,
//! encrypted secret) plus one share of the key. the key itself is never
//! stored and is wiped from memory after use.
//!
//! ## usage
//!
//! ```rust
//! use passwordsplit::{split, reconstruct, encode_part_to_base64, decode_part_from_base64};
//!
//! let result = split("correct horse battery staple", 2, 3, Some("wifi")).unwrap();
//!
//! // hand out parts as text
//! let encoded: Vec<String> = result.parts.iter().map(encode_part_to_base64).collect();
//!
//! // any 2 of them bring the password back
//! let parts = vec![
//!     decode_part_from_base64(&encoded[0]).unwrap(),
//!     decode_part_from_base64(&encoded[2]).unwrap(),
//! ];
//! let recovered = reconstruct(&parts).unwrap();
//! assert_eq!(recovered.secret, "correct horse battery staple");
//! ```

pub mod collector;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod license;
pub mod part;
pub mod scheme;
pub mod shamir;

pub use collector::PartCollector;
pub use error::{
    CollectError, CryptoError, IssueError, LicenseError, LicenseErrorKind, PartFormatError,
    ReconstructError, SplitError,
};
pub use gate::{authorize_split, SplitAccess, DEMO_PASSWORD};
pub use license::{
    format_time_left, verify_license_key, LicenseIssuer, LicenseKey, LicenseVerifier,
    PRODUCTION_PUBLIC_KEY_PEM,
};
pub use part::{decode_part_from_base64, encode_part_to_base64};
pub use scheme::{
    reconstruct, split, EncryptionMethod, Part, Reconstructed, SchemeMetadata, SplitResult,
    FORMAT_VERSION,
};
