//! CLI commands that change one tenant: `say`, `set`, `clear`, `remove`.

use anyhow::{bail, Result};
use std::io::Write;

use babble::CorpusStore;

/// Record one fragment, evicting the oldest when the corpus is full.
pub async fn say(store: &CorpusStore, tenant: &str, text: &str) -> Result<()> {
    store.ensure_tenant(tenant).await?;
    let evicted = store.record_fragment(tenant, text).await?;
    if evicted {
        println!("Recorded (oldest fragment evicted).");
    } else {
        println!("Recorded.");
    }
    Ok(())
}

pub async fn set(store: &CorpusStore, tenant: &str, field: &str, value: &str) -> Result<()> {
    store.change_setting(tenant, field, value).await?;
    println!("{field} = {value}");
    Ok(())
}

/// Delete the tenant's corpus after confirmation, unless `yes`.
pub async fn clear(store: &CorpusStore, tenant: &str, yes: bool) -> Result<()> {
    if !yes {
        let count = store.fragment_count(tenant).await?;
        println!("This will permanently delete {count} fragment(s) for tenant {tenant}.");
        print!("Type YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "YES" {
            bail!("clear cancelled");
        }
    }

    store.clear_corpus(tenant).await?;
    println!("Corpus cleared.");
    Ok(())
}

pub async fn remove(store: &CorpusStore, tenant: &str, pattern: &str) -> Result<()> {
    let deleted = store.remove_matching(tenant, pattern).await?;
    println!("Removed {deleted} fragment(s).");
    Ok(())
}
