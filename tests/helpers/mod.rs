#![allow(dead_code)]

use std::time::Duration;

use babble::db;
use babble::db::pool::PoolOptions;
use babble::db::retry::RetryPolicy;
use babble::{CorpusStore, StoreOptions};
use rusqlite::Connection;
use tempfile::TempDir;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Store options sized for tests: small corpus bound, fast retries, short pool timeout.
pub fn test_options(max_corpus_size: usize) -> StoreOptions {
    StoreOptions {
        max_corpus_size,
        read_cap: 1000,
        cache_ttl: Duration::from_secs(300),
        cache_capacity: 1_000,
        pool: PoolOptions {
            max_size: 4,
            acquire_timeout: Some(Duration::from_secs(5)),
            busy_timeout: Duration::from_secs(5),
        },
        retry: RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
    }
}

/// A store on a fresh on-disk database. Keep the `TempDir` alive for the test's duration.
pub async fn test_store(max_corpus_size: usize) -> (TempDir, CorpusStore) {
    open_store_with(test_options(max_corpus_size)).await
}

pub async fn open_store_with(options: StoreOptions) -> (TempDir, CorpusStore) {
    let dir = TempDir::new().unwrap();
    let store = CorpusStore::open(dir.path().join("babble.db"), options)
        .await
        .unwrap();
    (dir, store)
}

/// Record each fragment in order for `tenant`, creating the tenant first.
pub async fn record_all(store: &CorpusStore, tenant: &str, fragments: &[&str]) {
    store.ensure_tenant(tenant).await.unwrap();
    for fragment in fragments {
        store.record_fragment(tenant, fragment).await.unwrap();
    }
}
