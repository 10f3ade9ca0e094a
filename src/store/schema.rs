pub const SCHEMA: &str = r#"
-- group_ringtones table
CREATE TABLE IF NOT EXISTS group_ringtones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id INTEGER NOT NULL UNIQUE,
    ringtone_uri TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_group_ringtones_group_id ON group_ringtones(group_id);
"#;
