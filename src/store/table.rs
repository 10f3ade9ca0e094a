use crate::models::{RingtoneRecord, SetOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Record(RingtoneRecord),
    /// A line that is not a record; kept so rewrites don't lose it.
    Opaque(String),
}

/// Ordered in-memory view of every stored record.
///
/// Holds at most one record per group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingtoneTable {
    lines: Vec<Line>,
}

impl RingtoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = RingtoneRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.push_record(record);
        }
        table
    }

    pub fn get(&self, group_id: i64) -> Option<&str> {
        self.records()
            .find(|r| r.group_id == group_id)
            .map(|r| r.ringtone_uri.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &RingtoneRecord> {
        self.lines.iter().filter_map(|line| match line {
            Line::Record(record) => Some(record),
            Line::Opaque(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace, insert or drop the record for `group_id`, leaving every other
    /// line where it was.
    pub fn apply(&mut self, group_id: i64, ringtone_uri: Option<&str>) -> SetOutcome {
        let Some(uri) = ringtone_uri else {
            return match self.position(group_id) {
                Some(index) => {
                    self.lines.remove(index);
                    SetOutcome::Removed
                }
                None => SetOutcome::NotPresent,
            };
        };

        let existing = self.lines.iter_mut().find_map(|line| match line {
            Line::Record(record) if record.group_id == group_id => Some(record),
            _ => None,
        });
        match existing {
            Some(record) if record.ringtone_uri == uri => SetOutcome::Unchanged,
            Some(record) => {
                record.ringtone_uri = uri.to_string();
                SetOutcome::Updated
            }
            None => {
                self.lines
                    .push(Line::Record(RingtoneRecord::new(group_id, uri)));
                SetOutcome::Inserted
            }
        }
    }

    fn position(&self, group_id: i64) -> Option<usize> {
        self.lines.iter().position(|line| {
            matches!(line, Line::Record(record) if record.group_id == group_id)
        })
    }

    /// Append a record unless the group already has one. Returns whether it
    /// was added.
    pub(crate) fn push_record(&mut self, record: RingtoneRecord) -> bool {
        if self.get(record.group_id).is_some() {
            return false;
        }
        self.lines.push(Line::Record(record));
        true
    }

    pub(crate) fn push_opaque(&mut self, line: impl Into<String>) {
        self.lines.push(Line::Opaque(line.into()));
    }

    pub(crate) fn lines(&self) -> &[Line] {
        &self.lines
    }
}
