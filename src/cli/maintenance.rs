//! CLI maintenance commands: `tenants` and `trim`.

use anyhow::Result;

use babble::CorpusStore;

pub async fn tenants(store: &CorpusStore) -> Result<()> {
    let ids = store.list_tenants().await?;
    if ids.is_empty() {
        println!("No tenants.");
        return Ok(());
    }

    println!("{:<22} {:>9}", "Tenant", "Fragments");
    println!("{}", "-".repeat(32));
    for id in &ids {
        let count = store.fragment_count(id.as_str()).await?;
        println!("{:<22} {:>9}", id, count);
    }
    Ok(())
}

/// Trim every corpus to its newest `max` fragments.
pub async fn trim(store: &CorpusStore, max: usize) -> Result<()> {
    println!("Trimming every corpus to {max} fragments...");
    let report = store.trim_all(max).await?;

    if report.tenants_trimmed > 0 {
        println!(
            "  Deleted {} fragments across {} tenants.",
            report.fragments_deleted, report.tenants_trimmed
        );
    } else {
        println!("  Nothing to trim.");
    }
    Ok(())
}
