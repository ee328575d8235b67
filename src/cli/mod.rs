pub mod chat;
pub mod export;
pub mod generate;
pub mod inspect;
pub mod maintenance;
pub mod stats;
pub mod tenant;

use anyhow::{Context, Result};
use babble::config::BabbleConfig;
use babble::{CorpusStore, StoreOptions};

/// Open the configured store, creating the database on first use.
pub async fn open_store(config: &BabbleConfig) -> Result<CorpusStore> {
    let db_path = config.resolved_db_path();
    CorpusStore::open(&db_path, StoreOptions::from(config))
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

/// First `max` characters of `text`, with an ellipsis if anything was cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
