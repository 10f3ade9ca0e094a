use std::path::Path;

use crate::cli::{AppAction, USAGE};
use crate::config::Config;
use crate::error::Result;
use crate::models::{normalize_pick, SetOutcome};
use crate::store::GroupRingtoneStore;

pub struct App {
    store: GroupRingtoneStore,
    default_ringtone_uri: String,
    rename_after_import: bool,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let store = GroupRingtoneStore::open(config).await?;
        Ok(Self::with_store(store, config))
    }

    fn with_store(store: GroupRingtoneStore, config: &Config) -> Self {
        Self {
            store,
            default_ringtone_uri: config.default_ringtone_uri.clone(),
            rename_after_import: config.rename_after_import,
        }
    }

    /// Run one action and return what should be printed.
    pub async fn handle_action(&self, action: AppAction) -> Result<String> {
        let output = match action {
            AppAction::Help => USAGE.to_string(),

            AppAction::Get(group_id) => self
                .store
                .get_for_group(group_id)
                .await?
                .unwrap_or_default(),

            AppAction::Set(group_id, uri) => {
                let outcome = self.store.set_for_group(group_id, Some(&uri)).await?;
                describe(group_id, outcome)
            }

            AppAction::Clear(group_id) => {
                let outcome = self.store.set_for_group(group_id, None).await?;
                describe(group_id, outcome)
            }

            AppAction::Pick(group_id, picked) => {
                let custom = normalize_pick(picked.as_deref(), &self.default_ringtone_uri);
                let outcome = self
                    .store
                    .set_for_group(group_id, custom.as_deref())
                    .await?;
                describe(group_id, outcome)
            }

            AppAction::Effective(group_id) => self.effective_ringtone(group_id).await?,

            AppAction::List { json } => {
                let table = self.store.read_all().await?;
                let records: Vec<_> = table.records().collect();
                if json {
                    serde_json::to_string_pretty(&records)?
                } else if table.is_empty() {
                    "No custom ringtones".to_string()
                } else {
                    records
                        .iter()
                        .map(|r| format!("{}\t{}", r.group_id, r.ringtone_uri))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }

            AppAction::Export => self.store.export_legacy().await?,

            AppAction::Import(path) => self.import(&path).await?,
        };
        Ok(output)
    }

    /// The group's custom ringtone, or the default one when it has none.
    pub async fn effective_ringtone(&self, group_id: i64) -> Result<String> {
        Ok(self
            .store
            .get_for_group(group_id)
            .await?
            .unwrap_or_else(|| self.default_ringtone_uri.clone()))
    }

    async fn import(&self, path: &Path) -> Result<String> {
        let report = self
            .store
            .import_legacy(path, self.rename_after_import)
            .await?;
        if report.is_empty() {
            return Ok(format!("Nothing to import from {}", path.display()));
        }
        let mut summary = format!(
            "Imported {} records ({} already set, {} rejected)",
            report.imported, report.skipped_existing, report.rejected
        );
        if report.renamed {
            summary.push_str(&format!("; renamed {} to *.migrated", path.display()));
        }
        Ok(summary)
    }
}

fn describe(group_id: i64, outcome: SetOutcome) -> String {
    match outcome {
        SetOutcome::Inserted => format!("Set ringtone for group {}", group_id),
        SetOutcome::Updated => format!("Updated ringtone for group {}", group_id),
        SetOutcome::Unchanged => format!("Ringtone for group {} unchanged", group_id),
        SetOutcome::Removed => format!("Cleared ringtone for group {}", group_id),
        SetOutcome::NotPresent => format!("Group {} has no custom ringtone", group_id),
    }
}
