//! incremental part collection
//!
//! parts usually arrive one at a time (pasted, read from files). the
//! collector validates each one as it comes in so problems surface at the
//! part that caused them rather than at reconstruction.

use tracing::debug;

use crate::error::{CollectError, ReconstructError};
use crate::part::decode_part_from_base64;
use crate::scheme::{self, Part, Reconstructed, FORMAT_VERSION};

/// validated set of parts from a single split
#[derive(Debug, Default, Clone)]
pub struct PartCollector {
    parts: Vec<Part>,
}

impl PartCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// decode and add a transported part
    pub fn add_encoded(&mut self, encoded: &str) -> Result<&Part, CollectError> {
        let part = decode_part_from_base64(encoded)?;
        self.add(part)
    }

    /// add a decoded part
    ///
    /// the first part fixes the scheme; later parts must match it and bring
    /// a position in `1..=total_parts` not seen yet.
    pub fn add(&mut self, part: Part) -> Result<&Part, CollectError> {
        if part.metadata.version != FORMAT_VERSION {
            return Err(CollectError::UnsupportedVersion(part.metadata.version));
        }

        if !part.has_valid_position() {
            return Err(CollectError::InvalidPosition {
                position: part.position,
                total_parts: part.metadata.total_parts,
            });
        }

        if let Some(scheme_id) = self.scheme_id() {
            if part.metadata.scheme_id != scheme_id {
                return Err(CollectError::DifferentScheme);
            }
        }

        if self.parts.iter().any(|p| p.position == part.position) {
            return Err(CollectError::DuplicatePosition(part.position));
        }

        debug!(
            scheme_id = %part.metadata.scheme_id,
            position = part.position,
            collected = self.parts.len() + 1,
            "collected part"
        );

        self.parts.push(part);
        Ok(&self.parts[self.parts.len() - 1])
    }

    /// remove the part at `position`; removing the last part forgets the scheme
    pub fn remove(&mut self, position: u8) -> Option<Part> {
        let index = self.parts.iter().position(|p| p.position == position)?;
        Some(self.parts.remove(index))
    }

    pub fn clear(&mut self) {
        self.parts.clear();
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn scheme_id(&self) -> Option<&str> {
        self.parts.first().map(|p| p.metadata.scheme_id.as_str())
    }

    pub fn threshold(&self) -> Option<u8> {
        self.parts.first().map(|p| p.metadata.threshold)
    }

    /// parts still missing before reconstruction can be attempted
    pub fn remaining(&self) -> usize {
        self.threshold()
            .map_or(0, |t| (t as usize).saturating_sub(self.parts.len()))
    }

    pub fn is_ready(&self) -> bool {
        !self.parts.is_empty() && self.remaining() == 0
    }

    pub fn reconstruct(&self) -> Result<Reconstructed, ReconstructError> {
        scheme::reconstruct(&self.parts)
    }
}
