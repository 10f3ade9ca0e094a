use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};

/// Locators the platform treats as "use the default sound" rather than a
/// specific ringtone.
const PLATFORM_DEFAULT_URIS: &[&str] = &[
    "content://settings/system/ringtone",
    "content://settings/system/notification_sound",
    "content://settings/system/alarm_alert",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingtoneRecord {
    pub group_id: i64,
    pub ringtone_uri: String,
}

impl RingtoneRecord {
    pub fn new(group_id: i64, ringtone_uri: impl Into<String>) -> Self {
        Self {
            group_id,
            ringtone_uri: ringtone_uri.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    Updated,
    Unchanged,
    Removed,
    /// Cleared a group that had no record.
    NotPresent,
}

impl SetOutcome {
    pub fn is_change(self) -> bool {
        matches!(
            self,
            SetOutcome::Inserted | SetOutcome::Updated | SetOutcome::Removed
        )
    }
}

pub fn validate_uri(uri: &str) -> Result<()> {
    let invalid = |reason: &str| AppError::InvalidUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    if uri.trim().is_empty() {
        return Err(invalid("empty"));
    }
    // Url::parse silently strips these, but the flat file would split on them
    if uri.contains(['\n', '\r']) {
        return Err(invalid("contains a line break"));
    }
    Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;
    Ok(())
}

/// Turn a ringtone picker result into the value to store.
///
/// No pick, or a pick of the default sound, means the group has no custom
/// ringtone.
pub fn normalize_pick(picked: Option<&str>, default_uri: &str) -> Option<String> {
    let picked = picked.map(str::trim).filter(|p| !p.is_empty())?;
    if picked == default_uri || PLATFORM_DEFAULT_URIS.contains(&picked) {
        return None;
    }
    Some(picked.to_string())
}
