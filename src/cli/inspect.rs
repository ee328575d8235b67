//! CLI `inspect` command: display settings and recent fragments for one tenant.

use anyhow::Result;

use babble::CorpusStore;

use super::preview;

pub async fn inspect(store: &CorpusStore, tenant: &str, last: usize) -> Result<()> {
    let state = store.get_tenant(tenant).await?;
    let stored = store.fragment_count(tenant).await?;
    let s = &state.settings;

    println!("Tenant: {}", state.id);
    println!("{}", "=".repeat(50));
    println!("  Talk:           {}", if s.talk { "on" } else { "off" });
    println!("  Gen mode:       {:?}", s.gen_mode);
    println!("  Speed:          {}/10", s.speed);
    println!("  Language:       {}", s.lang);
    println!("  Fragments:      {stored} stored, {} loaded", state.corpus.len());
    println!();

    if state.corpus.is_empty() {
        println!("Corpus is empty.");
        return Ok(());
    }

    let skip = state.corpus.len().saturating_sub(last);
    println!("Newest fragments:");
    for fragment in &state.corpus[skip..] {
        println!("  {}", preview(fragment, 80));
    }

    Ok(())
}
