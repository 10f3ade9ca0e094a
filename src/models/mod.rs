mod ringtone;

pub use ringtone::{normalize_pick, validate_uri, RingtoneRecord, SetOutcome};
