use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::codec;
use super::table::RingtoneTable;

pub struct FlatFileStore {
    path: PathBuf,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty table.
    pub async fn read_table(&self) -> Result<RingtoneTable> {
        Ok(read_table_at(&self.path).await?.unwrap_or_default())
    }

    /// Replace the whole file. Written to a sibling file first and renamed
    /// over the original.
    pub async fn write_table(&self, table: &RingtoneTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = sibling_path(&self.path, "tmp");
        tokio::fs::write(&tmp_path, codec::encode(table)).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(
            "Wrote {} ringtone records to {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }
}

pub(crate) async fn read_table_at(path: &Path) -> Result<Option<RingtoneTable>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(codec::decode(&String::from_utf8_lossy(&bytes)))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}
