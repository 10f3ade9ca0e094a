use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{RingtoneRecord, SetOutcome};

use super::schema::SCHEMA;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn get_all(&self) -> Result<Vec<RingtoneRecord>> {
        let records = self
            .conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT group_id, ringtone_uri FROM group_ringtones ORDER BY id")?;
                let records = stmt
                    .query_map([], |row| Ok(RingtoneRecord::new(row.get(0)?, row.get::<_, String>(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    pub async fn get(&self, group_id: i64) -> Result<Option<String>> {
        let uri = self
            .conn
            .call(move |conn| {
                let uri = conn
                    .query_row(
                        "SELECT ringtone_uri FROM group_ringtones WHERE group_id = ?1",
                        params![group_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(uri)
            })
            .await?;
        Ok(uri)
    }

    pub async fn set(&self, group_id: i64, ringtone_uri: Option<String>) -> Result<SetOutcome> {
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let current: Option<String> = tx
                    .query_row(
                        "SELECT ringtone_uri FROM group_ringtones WHERE group_id = ?1",
                        params![group_id],
                        |row| row.get(0),
                    )
                    .optional()?;

                let outcome = match (current, ringtone_uri) {
                    (Some(current), Some(uri)) if current == uri => SetOutcome::Unchanged,
                    (Some(_), Some(uri)) => {
                        tx.execute(
                            "UPDATE group_ringtones SET ringtone_uri = ?1 WHERE group_id = ?2",
                            params![uri, group_id],
                        )?;
                        SetOutcome::Updated
                    }
                    (None, Some(uri)) => {
                        tx.execute(
                            "INSERT INTO group_ringtones (group_id, ringtone_uri) VALUES (?1, ?2)",
                            params![group_id, uri],
                        )?;
                        SetOutcome::Inserted
                    }
                    (Some(_), None) => {
                        tx.execute(
                            "DELETE FROM group_ringtones WHERE group_id = ?1",
                            params![group_id],
                        )?;
                        SetOutcome::Removed
                    }
                    (None, None) => SetOutcome::NotPresent,
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await?;
        Ok(outcome)
    }

    /// Insert a record unless the group already has one. Returns whether a
    /// row was written.
    pub async fn insert_if_absent(&self, record: RingtoneRecord) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO group_ringtones (group_id, ringtone_uri) VALUES (?1, ?2)",
                    params![record.group_id, record.ringtone_uri],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }
}
