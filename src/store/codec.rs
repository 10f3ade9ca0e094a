//! Text encoding of the flat ringtone file.
//!
//! One record per line, `GROUP_<id>-<uri>`, split on the first `-` only.
//! There is no header and no trailing newline.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::RingtoneRecord;

use super::table::{Line, RingtoneTable};

const RECORD_SEPARATOR: &str = "\n";
const FIELD_SEPARATOR: char = '-';

/// Value written by older writers when clearing a group that had no record.
const NULL_VALUE: &str = "null";

fn key_pattern() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^GROUP_(0|[1-9][0-9]*)$").expect("valid key pattern"))
}

pub fn record_key(group_id: i64) -> String {
    format!("GROUP_{group_id}")
}

fn parse_key(key: &str) -> Option<i64> {
    key_pattern()
        .captures(key)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn decode(text: &str) -> RingtoneTable {
    let mut table = RingtoneTable::new();

    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    for raw in text.split(RECORD_SEPARATOR) {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let parsed = line
            .split_once(FIELD_SEPARATOR)
            .and_then(|(key, value)| parse_key(key).map(|id| (id, value)));
        let Some((group_id, value)) = parsed else {
            tracing::debug!("Keeping unrecognised ringtone line: {:?}", line);
            table.push_opaque(line);
            continue;
        };

        if value.is_empty() || value == NULL_VALUE {
            tracing::debug!("Dropping empty ringtone record for group {}", group_id);
            continue;
        }

        if !table.push_record(RingtoneRecord::new(group_id, value)) {
            tracing::warn!(
                "Duplicate ringtone record for group {}, keeping the first",
                group_id
            );
        }
    }

    table
}

pub fn encode(table: &RingtoneTable) -> String {
    let lines: Vec<String> = table
        .lines()
        .iter()
        .map(|line| match line {
            Line::Record(record) => format!(
                "{}{}{}",
                record_key(record.group_id),
                FIELD_SEPARATOR,
                record.ringtone_uri
            ),
            Line::Opaque(text) => text.clone(),
        })
        .collect();
    lines.join(RECORD_SEPARATOR)
}
