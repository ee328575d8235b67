//! The corpus store: the async front for the per-tenant tables.
//!
//! Every method validates the tenant id first and fails with
//! [`StoreError::InvalidId`] before touching the database. SQL runs on a
//! pooled connection inside `spawn_blocking`, wrapped in the retry executor.
//! Reads go through two [`moka`] caches with a time-to-live; every write
//! invalidates the tenant's entries before returning. A tenant comes into
//! existence the first time it is read or written.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use rusqlite::Connection;
use tokio::task::JoinHandle;

use crate::config::BabbleConfig;
use crate::db;
use crate::db::pool::{ConnectionPool, PoolOptions};
use crate::db::retry::{self, RetryPolicy};
use crate::error::StoreError;

use super::maintenance::{self, TrimReport};
use super::queries;
use super::stats::{self, StatsReport};
use super::types::{SettingField, SettingValue, Tenant, TenantId};

/// Everything the store needs from the surrounding configuration.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_corpus_size: usize,
    /// Most fragments returned by one `get_tenant`.
    pub read_cap: usize,
    pub cache_ttl: Duration,
    /// Most tenants held in each cache.
    pub cache_capacity: u64,
    pub pool: PoolOptions,
    pub retry: RetryPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_corpus_size: 2000,
            read_cap: 1000,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 10_000,
            pool: PoolOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&BabbleConfig> for StoreOptions {
    fn from(config: &BabbleConfig) -> Self {
        let timeout_ms = config.storage.acquire_timeout_ms;
        Self {
            max_corpus_size: config.corpus.max_corpus_size,
            read_cap: config.corpus.read_cap,
            cache_ttl: Duration::from_secs(config.cache.ttl_secs),
            cache_capacity: config.cache.max_entries,
            pool: PoolOptions {
                max_size: config.storage.pool_size,
                acquire_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
                busy_timeout: Duration::from_millis(config.storage.busy_timeout_ms),
            },
            retry: RetryPolicy {
                attempts: config.retry.attempts,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                max_delay: Duration::from_millis(config.retry.max_delay_ms),
            },
        }
    }
}

/// Cheap to clone; clones share pool and caches.
#[derive(Clone)]
pub struct CorpusStore {
    pool: ConnectionPool,
    tenants: Cache<TenantId, Arc<Tenant>>,
    exists: Cache<TenantId, bool>,
    options: Arc<StoreOptions>,
}

fn build_cache<V>(options: &StoreOptions) -> Cache<TenantId, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(options.cache_capacity)
        .time_to_live(options.cache_ttl)
        .build()
}

impl CorpusStore {
    /// Open (or create) the database at `path`, apply schema and migrations,
    /// and return a store with an empty cache.
    pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let setup_path = path.clone();
        tokio::task::spawn_blocking(move || db::open_database(&setup_path).map(drop)).await??;

        let pool = ConnectionPool::new(&path, options.pool.clone());
        tracing::info!(
            path = %path.display(),
            pool_size = pool.max_size(),
            max_corpus_size = options.max_corpus_size,
            "corpus store ready"
        );

        Ok(Self {
            pool,
            tenants: build_cache(&options),
            exists: build_cache(&options),
            options: Arc::new(options),
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn db_path(&self) -> PathBuf {
        self.pool.path().to_path_buf()
    }

    /// Run `f` on a pooled connection off the async runtime, retrying transient failures.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: Fn(&mut Connection) -> rusqlite::Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        retry::retry(&self.options.retry, op, || {
            let f = Arc::clone(&f);
            let pool = self.pool.clone();
            async move {
                tokio::task::spawn_blocking(move || {
                    let mut conn = pool.get()?;
                    (*f)(&mut *conn).map_err(StoreError::from)
                })
                .await?
            }
        })
        .await
    }

    fn invalidate(&self, id: &TenantId) {
        self.tenants.invalidate(id);
        self.exists.invalidate(id);
    }

    /// Create the tenant with default settings if it does not exist yet.
    pub async fn ensure_tenant(&self, id: &str) -> Result<(), StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let created = self
            .run("ensure_tenant", move |conn| queries::insert_peer_if_absent(conn, &key))
            .await?;
        self.invalidate(&id);
        if created {
            tracing::info!(tenant = %id, "tenant created");
        }
        Ok(())
    }

    /// Settings plus the newest `read_cap` fragments, oldest first. An unknown
    /// tenant is created with default settings and an empty corpus.
    pub async fn get_tenant(&self, id: &str) -> Result<Arc<Tenant>, StoreError> {
        let id = TenantId::parse(id)?;
        if let Some(tenant) = self.tenants.get(&id) {
            tracing::trace!(tenant = %id, "tenant cache hit");
            return Ok(tenant);
        }

        tracing::debug!(tenant = %id, "tenant cache miss");
        let key = id.clone();
        let cap = self.options.read_cap;
        let (tenant, created) = self
            .run("get_tenant", move |conn| queries::load_or_create_tenant(conn, &key, cap))
            .await?;
        if created {
            tracing::info!(tenant = %id, "tenant created on first read");
        }

        let tenant = Arc::new(tenant);
        self.tenants.insert(id.clone(), Arc::clone(&tenant));
        self.exists.insert(id, true);
        Ok(tenant)
    }

    /// Append one fragment, creating the tenant if needed. Does not enforce the
    /// corpus bound; see [`Self::record_fragment`].
    pub async fn append_fragment(&self, id: &str, text: &str) -> Result<(), StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let text = text.to_owned();
        let created = self
            .run("append_fragment", move |conn| queries::append_fragment(conn, &key, &text))
            .await?;
        self.invalidate(&id);
        if created {
            tracing::info!(tenant = %id, "tenant created on first fragment");
        }
        Ok(())
    }

    /// Remove the single oldest fragment. No-op on an empty corpus.
    pub async fn evict_oldest(&self, id: &str) -> Result<(), StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let evicted = self
            .run("evict_oldest", move |conn| queries::delete_oldest_fragment(conn, &key))
            .await?;
        self.invalidate(&id);
        tracing::debug!(tenant = %id, evicted, "evict oldest");
        Ok(())
    }

    /// Evict the oldest fragment when the corpus is at `max_corpus_size`, then append.
    /// Returns `true` if a fragment was evicted.
    ///
    /// The count, eviction and append are separate statements, so two concurrent
    /// callers on one tenant can briefly push the corpus one past the bound.
    pub async fn record_fragment(&self, id: &str, text: &str) -> Result<bool, StoreError> {
        let count = self.fragment_count(id).await?;
        let evict = count >= self.options.max_corpus_size;
        if evict {
            self.evict_oldest(id).await?;
        }
        self.append_fragment(id, text).await?;
        Ok(evict)
    }

    /// Uncached number of stored fragments, empty ones included.
    pub async fn fragment_count(&self, id: &str) -> Result<usize, StoreError> {
        let id = TenantId::parse(id)?;
        self.run("fragment_count", move |conn| queries::count_fragments(conn, &id))
            .await
    }

    /// Change one setting by name. `field` must be `talk`, `genMode`, `speed` or `lang`.
    pub async fn change_setting(&self, id: &str, field: &str, value: &str) -> Result<(), StoreError> {
        TenantId::parse(id)?;
        let field: SettingField = field.parse()?;
        let value = field.parse_value(value)?;
        self.set_setting(id, value).await
    }

    /// Typed form of [`Self::change_setting`].
    pub async fn set_setting(&self, id: &str, value: SettingValue) -> Result<(), StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let result = self
            .run("change_setting", move |conn| queries::update_setting(conn, &key, &value))
            .await;
        self.invalidate(&id);
        result?;
        tracing::info!(tenant = %id, field = value.field().name(), ?value, "setting changed");
        Ok(())
    }

    /// Delete every fragment; settings stay.
    pub async fn clear_corpus(&self, id: &str) -> Result<(), StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let deleted = self
            .run("clear_corpus", move |conn| queries::delete_all_fragments(conn, &key))
            .await?;
        self.invalidate(&id);
        tracing::info!(tenant = %id, deleted, "corpus cleared");
        Ok(())
    }

    /// Delete every fragment containing `pattern`. Returns how many went.
    pub async fn remove_matching(&self, id: &str, pattern: &str) -> Result<usize, StoreError> {
        let id = TenantId::parse(id)?;
        let key = id.clone();
        let pattern = pattern.to_owned();
        let deleted = self
            .run("remove_matching", move |conn| queries::delete_matching(conn, &key, &pattern))
            .await?;
        self.invalidate(&id);
        tracing::info!(tenant = %id, deleted, "removed matching fragments");
        Ok(deleted)
    }

    pub async fn tenant_exists(&self, id: &str) -> Result<bool, StoreError> {
        let id = TenantId::parse(id)?;
        if let Some(exists) = self.exists.get(&id) {
            return Ok(exists);
        }
        let key = id.clone();
        let exists = self
            .run("tenant_exists", move |conn| queries::peer_exists(conn, &key))
            .await?;
        self.exists.insert(id, exists);
        Ok(exists)
    }

    /// Every tenant with a settings row, in numeric order.
    pub async fn list_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        self.run("list_tenants", |conn| maintenance::list_peers(conn)).await
    }

    /// Cut every corpus down to its newest `max` fragments.
    pub async fn trim_all(&self, max: usize) -> Result<TrimReport, StoreError> {
        let report = self
            .run("trim_all", move |conn| maintenance::trim_all(conn, max))
            .await?;
        self.tenants.invalidate_all();
        self.exists.invalidate_all();
        Ok(report)
    }

    pub async fn stats(&self) -> Result<StatsReport, StoreError> {
        let path = self.db_path();
        self.run("stats", move |conn| stats::corpus_stats(conn, Some(path.as_path())))
            .await
    }

    /// Periodically run the caches' pending maintenance so expired entries are
    /// dropped even when nobody reads them. The task runs until aborted.
    pub fn spawn_cache_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let tenants = self.tenants.clone();
        let exists = self.exists.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tenants.run_pending_tasks();
                exists.run_pending_tasks();
                tracing::trace!(
                    tenants = tenants.entry_count(),
                    exists = exists.entry_count(),
                    "cache sweep"
                );
            }
        })
    }

    /// Stop handing out connections. In-flight operations finish normally.
    pub fn close(&self) {
        self.pool.close();
    }
}
