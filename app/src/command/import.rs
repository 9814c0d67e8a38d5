use std::path::PathBuf;

use lexqa_config::Config;
use lexqa_engine::storage::{CommentRecord, DocRecord, EmailRecord, IssueRecord};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::ImportKind;

#[derive(Debug, Clone)]
pub struct ImportInput {
    pub kind: ImportKind,
    /// JSON array of rows.
    pub file: PathBuf,
}

/// Strategy for loading an origin corpus from a local JSON file.
///
/// Emails are threaded through the persisted conversation registry.
#[derive(Debug, Clone, Copy)]
pub struct ImportStrategy;

fn read_rows<T: DeserializeOwned>(input: &ImportInput) -> anyhow::Result<Vec<T>> {
    let content = std::fs::read_to_string(&input.file)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid rows in {}: {e}", input.file.display()))
}

impl super::CommandStrategy for ImportStrategy {
    type Input = ImportInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        let imported = match input.kind {
            ImportKind::Docs => store.import_docs(read_rows::<DocRecord>(&input)?).await?,
            ImportKind::Emails => {
                let rows = read_rows::<EmailRecord>(&input)?;
                let mut registry = store.load_conversations().await?;
                let imported = store.import_emails(rows, &mut registry).await?;
                info!("{} conversations registered", registry.len());
                imported
            }
            ImportKind::Issues => store.import_issues(read_rows::<IssueRecord>(&input)?).await?,
            ImportKind::Comments => {
                store
                    .import_comments(read_rows::<CommentRecord>(&input)?)
                    .await?
            }
        };

        info!("Imported {} rows from {}", imported, input.file.display());
        println!("Imported {imported} {:?} rows", input.kind);
        Ok(())
    }
}
