//! license gate for splitting
//!
//! the demo password can always be split so people can try the tool;
//! anything else needs a license that is still active.

use chrono::{DateTime, Utc};

use crate::error::SplitError;
use crate::license::LicenseKey;

/// password that may be split without a license
pub const DEMO_PASSWORD: &str = "MyPassword123";

/// why a split was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAccess {
    Demo,
    Licensed,
}

/// decide whether `password` may be split at `now`
pub fn authorize_split(
    password: &str,
    license: Option<&LicenseKey>,
    now: DateTime<Utc>,
) -> Result<SplitAccess, SplitError> {
    if password == DEMO_PASSWORD {
        return Ok(SplitAccess::Demo);
    }

    match license {
        Some(license) if !password.is_empty() && license.is_active_at(now) => Ok(SplitAccess::Licensed),
        _ => Err(SplitError::LicenseRequired),
    }
}
