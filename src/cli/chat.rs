//! CLI `chat` command: treat stdin as one tenant's message stream.
//!
//! Every non-blank line is recorded. When the tenant has `talk` on, a reply
//! is generated with probability `speed / 10` and printed to stdout.

use anyhow::Result;
use rand::Rng;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use babble::config::BabbleConfig;
use babble::{CorpusStore, Markov};

pub async fn chat(store: &CorpusStore, config: &BabbleConfig, tenant: &str) -> Result<()> {
    store.ensure_tenant(tenant).await?;
    let sweeper =
        store.spawn_cache_sweeper(Duration::from_secs(config.cache.sweep_interval_secs));
    eprintln!("Chatting as tenant {tenant}. Ctrl-D to stop.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = async {
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(reply) = handle_line(store, config, tenant, line).await? {
                println!("{reply}");
            }
        }
        anyhow::Ok(())
    }
    .await;

    sweeper.abort();
    result
}

async fn handle_line(
    store: &CorpusStore,
    config: &BabbleConfig,
    tenant: &str,
    line: &str,
) -> Result<Option<String>> {
    store.record_fragment(tenant, line).await?;

    let state = store.get_tenant(tenant).await?;
    if !state.settings.talk {
        return Ok(None);
    }
    let chance = f64::from(state.settings.speed) / 10.0;
    if !rand::rng().random_bool(chance.clamp(0.0, 1.0)) {
        return Ok(None);
    }

    let reply = Markov::build(&state.corpus).generate(state.settings.gen_mode, config.generation.max_length);
    if reply.is_none() {
        tracing::debug!(tenant, "no reply, corpus too small");
    }
    Ok(reply)
}
