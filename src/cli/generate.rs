use anyhow::Result;

use babble::corpus::types::GenMode;
use babble::{CorpusStore, Markov};

/// Print `count` samples from the tenant's corpus, one per line.
///
/// `mode` falls back to the tenant's own `genMode` setting.
pub async fn generate(
    store: &CorpusStore,
    tenant: &str,
    mode: Option<GenMode>,
    max_length: usize,
    count: usize,
) -> Result<()> {
    let tenant = store.get_tenant(tenant).await?;
    let mode = mode.unwrap_or(tenant.settings.gen_mode);
    let markov = Markov::build(&tenant.corpus);

    if markov.is_empty() {
        eprintln!("Not enough data to generate from (corpus is empty).");
        return Ok(());
    }

    for _ in 0..count {
        if let Some(text) = markov.generate(mode, max_length) {
            println!("{text}");
        }
    }
    Ok(())
}
