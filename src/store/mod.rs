//! Per-group custom ringtone storage.
//!
//! [`GroupRingtoneStore`] keeps one optional ringtone URI per contact group,
//! either in the legacy flat text file or in SQLite. Every read-modify-write
//! sequence on one store runs under its own lock.

mod codec;
mod flat_file;
mod schema;
mod sqlite;
mod table;

use std::path::Path;

use tokio::sync::Mutex;

use crate::config::{BackendKind, Config};
use crate::error::{AppError, Result};
use crate::models::{validate_uri, SetOutcome};

use flat_file::FlatFileStore;
use sqlite::SqliteStore;

pub use table::RingtoneTable;

enum Backend {
    FlatFile(FlatFileStore),
    Sqlite(SqliteStore),
}

pub struct GroupRingtoneStore {
    backend: Backend,
    write_lock: Mutex<()>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_existing: usize,
    pub rejected: usize,
    pub renamed: bool,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.imported == 0 && self.skipped_existing == 0 && self.rejected == 0
    }

    /// Every usable legacy record is now in the store.
    fn carried_over(&self) -> bool {
        self.imported + self.skipped_existing > 0
    }
}

impl GroupRingtoneStore {
    pub async fn open(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::FlatFile => Ok(Self::flat_file(&config.store_path)),
            BackendKind::Sqlite => Self::sqlite(&config.db_path).await,
        }
    }

    pub fn flat_file(path: impl AsRef<Path>) -> Self {
        Self::with_backend(Backend::FlatFile(FlatFileStore::new(path.as_ref())))
    }

    pub async fn sqlite(db_path: &str) -> Result<Self> {
        Ok(Self::with_backend(Backend::Sqlite(
            SqliteStore::new(db_path).await?,
        )))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn read_all(&self) -> Result<RingtoneTable> {
        match &self.backend {
            Backend::FlatFile(file) => file.read_table().await,
            Backend::Sqlite(db) => Ok(RingtoneTable::from_records(db.get_all().await?)),
        }
    }

    /// `Ok(None)` when the group has no custom ringtone.
    pub async fn get_for_group(&self, group_id: i64) -> Result<Option<String>> {
        check_group_id(group_id)?;
        match &self.backend {
            Backend::FlatFile(file) => Ok(file.read_table().await?.get(group_id).map(String::from)),
            Backend::Sqlite(db) => db.get(group_id).await,
        }
    }

    /// Store `ringtone_uri` for the group, or drop its record when `None`.
    pub async fn set_for_group(
        &self,
        group_id: i64,
        ringtone_uri: Option<&str>,
    ) -> Result<SetOutcome> {
        check_group_id(group_id)?;
        if let Some(uri) = ringtone_uri {
            validate_uri(uri)?;
        }

        let _guard = self.write_lock.lock().await;
        let outcome = match &self.backend {
            Backend::FlatFile(file) => {
                let mut table = file.read_table().await?;
                let outcome = table.apply(group_id, ringtone_uri);
                if outcome.is_change() {
                    file.write_table(&table).await?;
                }
                outcome
            }
            Backend::Sqlite(db) => db.set(group_id, ringtone_uri.map(String::from)).await?,
        };

        tracing::info!("Ringtone for group {}: {:?}", group_id, outcome);
        Ok(outcome)
    }

    /// Lossy lookup: empty string when the group has no custom ringtone or
    /// the store can't be read. Use [`Self::get_for_group`] to tell the two
    /// apart.
    #[allow(dead_code)]
    pub async fn get(&self, group_id: i64) -> String {
        match self.get_for_group(group_id).await {
            Ok(uri) => uri.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read ringtone for group {}: {}", group_id, e);
                String::new()
            }
        }
    }

    /// Lossy update: failures are logged and otherwise ignored. Use
    /// [`Self::set_for_group`] to see them.
    #[allow(dead_code)]
    pub async fn set(&self, group_id: i64, ringtone_uri: Option<&str>) {
        if let Err(e) = self.set_for_group(group_id, ringtone_uri).await {
            tracing::warn!("Failed to store ringtone for group {}: {}", group_id, e);
        }
    }

    /// Current table in the flat file format.
    pub async fn export_legacy(&self) -> Result<String> {
        Ok(codec::encode(&self.read_all().await?))
    }

    /// Merge records from a legacy flat file. Groups that already have a
    /// ringtone keep it.
    pub async fn import_legacy(&self, path: &Path, rename: bool) -> Result<ImportReport> {
        if let Backend::FlatFile(file) = &self.backend {
            if same_file(file.path(), path).await {
                return Err(AppError::Config(format!(
                    "{} is the active store and can't be imported into itself",
                    path.display()
                )));
            }
        }

        let Some(legacy) = flat_file::read_table_at(path).await? else {
            tracing::info!("No legacy ringtone file at {}", path.display());
            return Ok(ImportReport::default());
        };

        let _guard = self.write_lock.lock().await;
        let mut report = ImportReport::default();
        let mut valid = Vec::new();
        for record in legacy.records() {
            match validate_uri(&record.ringtone_uri) {
                Ok(()) => valid.push(record.clone()),
                Err(e) => {
                    tracing::warn!("Skipping legacy record for group {}: {}", record.group_id, e);
                    report.rejected += 1;
                }
            }
        }

        match &self.backend {
            Backend::FlatFile(file) => {
                let mut table = file.read_table().await?;
                for record in valid {
                    if table.push_record(record) {
                        report.imported += 1;
                    } else {
                        report.skipped_existing += 1;
                    }
                }
                if report.imported > 0 {
                    file.write_table(&table).await?;
                }
            }
            Backend::Sqlite(db) => {
                for record in valid {
                    if db.insert_if_absent(record).await? {
                        report.imported += 1;
                    } else {
                        report.skipped_existing += 1;
                    }
                }
            }
        }

        if rename && report.carried_over() {
            let target = flat_file::sibling_path(path, "migrated");
            match tokio::fs::rename(path, &target).await {
                Ok(()) => report.renamed = true,
                Err(e) => tracing::warn!(
                    "Imported {} but could not rename it to {}: {}",
                    path.display(),
                    target.display(),
                    e
                ),
            }
        }

        tracing::info!(
            "Imported {} legacy ringtone records from {} ({} already set, {} rejected)",
            report.imported,
            path.display(),
            report.skipped_existing,
            report.rejected
        );
        Ok(report)
    }
}

/// Both paths name the same file. Falls back to comparing the paths as
/// written when either can't be resolved.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn check_group_id(group_id: i64) -> Result<()> {
    if group_id < 0 {
        return Err(AppError::InvalidGroupId(group_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RINGTONE_1: &str = "content://settings/system/ringtone_1";
    const RINGTONE_2: &str = "content://settings/system/ringtone_2";

    fn flat_store(dir: &tempfile::TempDir) -> GroupRingtoneStore {
        GroupRingtoneStore::flat_file(dir.path().join("group_ringtone_file.txt"))
    }

    async fn sqlite_store() -> GroupRingtoneStore {
        GroupRingtoneStore::with_backend(Backend::Sqlite(SqliteStore::in_memory().await.unwrap()))
    }

    /// Runs the same checks against both backends.
    async fn check_store_contract(store: &GroupRingtoneStore) {
        assert_eq!(store.get(5).await, "");
        assert_eq!(store.get(0).await, "");

        store.set(1, Some("content://a")).await;
        store.set(2, Some("content://b")).await;
        store.set(1, Some("content://c")).await;
        assert_eq!(store.get(1).await, "content://c");
        assert_eq!(store.get(2).await, "content://b");
        assert_eq!(store.read_all().await.unwrap().len(), 2);

        store.set(2, Some("content://b")).await;
        assert_eq!(store.get(2).await, "content://b");
        assert_eq!(store.read_all().await.unwrap().len(), 2);

        store.set(1, None).await;
        assert_eq!(store.get(1).await, "");
        assert_eq!(store.get(2).await, "content://b");
        assert_eq!(store.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flat_file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        check_store_contract(&flat_store(&dir)).await;
    }

    #[tokio::test]
    async fn sqlite_store_contract() {
        check_store_contract(&sqlite_store().await).await;
    }

    #[tokio::test]
    async fn example_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat_store(&dir);

        store.set(5, Some(RINGTONE_1)).await;
        store.set(7, Some(RINGTONE_2)).await;
        assert_eq!(store.get(5).await, RINGTONE_1);

        store.set(5, None).await;
        assert_eq!(store.get(5).await, "");
        assert_eq!(store.get(7).await, RINGTONE_2);

        let on_disk = std::fs::read_to_string(dir.path().join("group_ringtone_file.txt")).unwrap();
        assert_eq!(on_disk, format!("GROUP_7-{RINGTONE_2}"));
    }

    #[tokio::test]
    async fn file_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_ringtone_file.txt");
        let store = GroupRingtoneStore::flat_file(&path);

        assert_eq!(store.get_for_group(3).await.unwrap(), None);
        assert_eq!(store.set_for_group(3, None).await.unwrap(), SetOutcome::NotPresent);
        assert!(!path.exists());

        store.set_for_group(3, Some(RINGTONE_1)).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn read_failure_is_distinguishable_from_absent() {
        let dir = tempfile::tempdir().unwrap();
        // a directory can't be read as the store file
        let store = GroupRingtoneStore::flat_file(dir.path());

        assert!(store.get_for_group(1).await.is_err());
        assert_eq!(store.get(1).await, "");
        store.set(1, Some(RINGTONE_1)).await;
    }

    #[tokio::test]
    async fn invalid_input_never_touches_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_ringtone_file.txt");
        let store = GroupRingtoneStore::flat_file(&path);

        assert!(matches!(
            store.set_for_group(1, Some("content://a\nGROUP_2-x")).await,
            Err(AppError::InvalidUri { .. })
        ));
        assert!(matches!(
            store.set_for_group(-99, Some(RINGTONE_1)).await,
            Err(AppError::InvalidGroupId(_))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unrelated_lines_survive_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_ringtone_file.txt");
        std::fs::write(&path, "GROUP_1-content://a\nsomething else\nGROUP_2-content://b").unwrap();
        let store = GroupRingtoneStore::flat_file(&path);

        store.set_for_group(1, Some("content://z")).await.unwrap();
        store.set_for_group(3, Some("content://c")).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "GROUP_1-content://z\nsomething else\nGROUP_2-content://b\nGROUP_3-content://c"
        );
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(flat_store(&dir));

        let mut handles = Vec::new();
        for group_id in 0..16 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let uri = format!("content://media/internal/audio/media/{group_id}");
                store.set_for_group(group_id, Some(&uri)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.read_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn export_matches_flat_file_format() {
        let store = sqlite_store().await;
        store.set_for_group(5, Some(RINGTONE_1)).await.unwrap();
        store.set_for_group(7, Some(RINGTONE_2)).await.unwrap();

        assert_eq!(
            store.export_legacy().await.unwrap(),
            format!("GROUP_5-{RINGTONE_1}\nGROUP_7-{RINGTONE_2}")
        );
    }

    #[tokio::test]
    async fn import_keeps_existing_and_renames_source() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("group_ringtone_file.txt");
        std::fs::write(
            &legacy,
            "GROUP_1-content://legacy/1\nGROUP_2-content://legacy/2\nGROUP_3-null\nGROUP_4-not a uri",
        )
        .unwrap();

        let store = sqlite_store().await;
        store.set_for_group(2, Some("content://mine")).await.unwrap();

        let report = store.import_legacy(&legacy, true).await.unwrap();

        assert_eq!(
            report,
            ImportReport {
                imported: 1,
                skipped_existing: 1,
                rejected: 1,
                renamed: true,
            }
        );
        assert_eq!(store.get(1).await, "content://legacy/1");
        assert_eq!(store.get(2).await, "content://mine");
        assert!(!legacy.exists());
        assert!(dir.path().join("group_ringtone_file.txt.migrated").exists());
    }

    #[tokio::test]
    async fn import_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat_store(&dir);

        let report = store
            .import_legacy(&dir.path().join("nothing.txt"), true)
            .await
            .unwrap();

        assert!(report.is_empty());
        assert!(!report.renamed);
    }

    #[tokio::test]
    async fn import_into_flat_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("old.txt");
        std::fs::write(&legacy, "GROUP_8-content://legacy/8").unwrap();
        let store = flat_store(&dir);

        let report = store.import_legacy(&legacy, false).await.unwrap();

        assert_eq!(report.imported, 1);
        assert!(legacy.exists());
        assert_eq!(store.get(8).await, "content://legacy/8");
    }

    #[tokio::test]
    async fn refuses_to_import_itself_under_another_spelling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let path = dir.path().join("group_ringtone_file.txt");
        let store = GroupRingtoneStore::flat_file(&path);
        store.set_for_group(5, Some("content://a")).await.unwrap();

        let other_spelling = dir.path().join("sub").join("..").join("group_ringtone_file.txt");
        assert!(matches!(
            store.import_legacy(&other_spelling, true).await,
            Err(AppError::Config(_))
        ));
        assert!(path.exists());
        assert_eq!(store.get(5).await, "content://a");
    }

    #[tokio::test]
    async fn file_without_usable_records_is_not_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("old.txt");
        std::fs::write(&legacy, "GROUP_3-null
something else
GROUP_4-not a uri").unwrap();
        let store = flat_store(&dir);

        let report = store.import_legacy(&legacy, true).await.unwrap();

        assert_eq!(report.rejected, 1);
        assert!(!report.renamed);
        assert!(legacy.exists());
    }

    #[tokio::test]
    async fn failed_rename_still_reports_import() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("old.txt");
        std::fs::write(&legacy, "GROUP_8-content://legacy/8").unwrap();
        // a non-empty directory in the way of the rename target
        let blocker = dir.path().join("old.txt.migrated");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();
        let store = flat_store(&dir);

        let report = store.import_legacy(&legacy, true).await.unwrap();

        assert_eq!(report.imported, 1);
        assert!(!report.renamed);
        assert!(legacy.exists());
        assert_eq!(store.get(8).await, "content://legacy/8");
    }

    #[tokio::test]
    async fn refuses_to_import_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_ringtone_file.txt");
        let store = GroupRingtoneStore::flat_file(&path);

        assert!(matches!(
            store.import_legacy(&path, true).await,
            Err(AppError::Config(_))
        ));
    }
}
