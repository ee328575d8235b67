use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use babble::corpus::types::Tenant;
use babble::CorpusStore;

/// Export format: a timestamp plus every tenant's settings and loaded corpus.
#[derive(Debug, Serialize)]
struct ExportData {
    exported_at: DateTime<Utc>,
    tenants: Vec<Tenant>,
}

/// Export tenants as JSON to stdout. Each corpus is capped at `read_cap` fragments.
pub async fn export(store: &CorpusStore, only: Option<&str>) -> Result<()> {
    let ids: Vec<String> = match only {
        Some(id) => vec![id.to_owned()],
        None => store
            .list_tenants()
            .await?
            .into_iter()
            .map(String::from)
            .collect(),
    };

    let mut tenants = Vec::with_capacity(ids.len());
    for id in &ids {
        let tenant = store.get_tenant(id).await?;
        tenants.push(Tenant::clone(&tenant));
    }

    let data = ExportData {
        exported_at: Utc::now(),
        tenants,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    let fragments: usize = data.tenants.iter().map(|t| t.corpus.len()).sum();
    eprintln!(
        "Exported {} tenants and {} fragments.",
        data.tenants.len(),
        fragments
    );

    Ok(())
}
