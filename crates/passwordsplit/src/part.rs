//! part transport encoding
//!
//! a part travels as standard base64 over the utf-8 json of
//! `{ metadata, part, position }`. byte fields inside the json (iv,
//! encrypted secret, share) are standard base64 strings as well.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::PartFormatError;
use crate::scheme::Part;

/// longest description prefix used in titles
const TITLE_DESCRIPTION_LEN: usize = 50;

/// encode a part as base64(json)
pub fn encode_part_to_base64(part: &Part) -> String {
    // every field is a string, an integer or a timestamp and all keys are
    // struct fields, so serde_json has no failure path here
    let json = serde_json::to_string(part).unwrap_or_else(|e| unreachable!("part json: {e}"));
    BASE64.encode(json)
}

/// decode a part produced by `encode_part_to_base64`
///
/// surrounding whitespace (e.g. a trailing newline from a file) is ignored.
pub fn decode_part_from_base64(encoded: &str) -> Result<Part, PartFormatError> {
    let bytes = BASE64.decode(encoded.trim())?;
    let json = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&json)?)
}

impl Part {
    pub fn to_base64(&self) -> String {
        encode_part_to_base64(self)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, PartFormatError> {
        decode_part_from_base64(encoded)
    }

    /// human title, e.g. `Work_laptop_Part_2`
    pub fn title(&self) -> String {
        match self.metadata.description.as_deref().map(sanitize_description) {
            Some(desc) if !desc.is_empty() => format!("{}_Part_{}", desc, self.position),
            _ => format!("Shamir Password Share - Part {}", self.position),
        }
    }

    /// file name for storing the encoded part
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.title())
    }
}

/// keep ascii alphanumerics, collapse everything else into single `_`
fn sanitize_description(description: &str) -> String {
    let mut out = String::with_capacity(TITLE_DESCRIPTION_LEN);
    for c in description.chars().take(TITLE_DESCRIPTION_LEN) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// base64 serialization helper for serde
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}
