//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Pack sizes**: the active configuration is an immutable
//!   [`ActiveConfiguration`] behind an `Arc`, swapped atomically on
//!   replace-all. A calculation clones the `Arc` once and never observes a
//!   half-written set. The optimizer for the configuration is built when the
//!   configuration is installed, not per request.
//! - **Calculation cache**: results memoized per `(signature, order)` in a
//!   bounded `DashMap`.
//! - **Solve permits**: a semaphore caps optimizer runs in flight at
//!   `MAX_CONCURRENT_SOLVES`, bounding the memory held by solver tables.
//! - **Database** (optional): the active configuration and memoized results
//!   are persisted to PostgreSQL and hydrated on start-up.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use packcalc_core::{Decomposition, OrderQuantity, PackError, PackOptimizer, PackSizeSet};
use parking_lot::RwLock;
use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::db;
use crate::error::AppError;
use crate::middleware::metrics::{self, CacheSource};

// -- Active configuration -----------------------------------------------------

/// A pack-size configuration ready to answer orders.
#[derive(Debug)]
pub struct ActiveConfiguration {
    /// Row id in `pack_configurations`, when persisted.
    id: Option<i64>,
    signature: String,
    optimizer: PackOptimizer,
}

impl ActiveConfiguration {
    pub fn new(sizes: PackSizeSet) -> Self {
        Self {
            id: None,
            signature: sizes.signature(),
            optimizer: PackOptimizer::new(sizes),
        }
    }

    fn with_id(mut self, id: Option<i64>) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn sizes(&self) -> &PackSizeSet {
        self.optimizer.sizes()
    }

    pub fn optimizer(&self) -> &PackOptimizer {
        &self.optimizer
    }
}

/// Atomically swapped pack-size snapshot.
///
/// Readers take the `parking_lot` read lock only long enough to clone the
/// `Arc`. Writers serialize on an async mutex so the database row and the
/// in-memory snapshot change together.
#[derive(Debug, Clone, Default)]
pub struct PackSizeStore {
    current: Arc<RwLock<Option<Arc<ActiveConfiguration>>>>,
    writer: Arc<tokio::sync::Mutex<()>>,
}

impl PackSizeStore {
    pub fn new(initial: Option<ActiveConfiguration>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.map(Arc::new))),
            writer: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The active configuration, if any.
    pub fn snapshot(&self) -> Option<Arc<ActiveConfiguration>> {
        self.current.read().clone()
    }

    /// The active configuration, or [`PackError::EmptySet`].
    pub fn require(&self) -> Result<Arc<ActiveConfiguration>, PackError> {
        self.snapshot().ok_or(PackError::EmptySet)
    }

    fn install(&self, active: ActiveConfiguration) -> Arc<ActiveConfiguration> {
        let active = Arc::new(active);
        *self.current.write() = Some(Arc::clone(&active));
        active
    }
}

// -- Calculation cache --------------------------------------------------------

/// Memo key: configuration signature plus order quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    signature: String,
    order: OrderQuantity,
}

impl CacheKey {
    pub fn new(signature: impl Into<String>, order: OrderQuantity) -> Self {
        Self {
            signature: signature.into(),
            order,
        }
    }
}

/// Bounded in-process memo of calculation results.
///
/// When full, arbitrary entries are evicted. Concurrent inserts may overshoot
/// `capacity` briefly; every insert trims back down before returning. Keys
/// include the configuration signature, so entries never go stale on
/// replace-all.
#[derive(Debug, Clone)]
pub struct CalculationCache {
    entries: Arc<DashMap<CacheKey, Decomposition>>,
    capacity: usize,
}

impl CalculationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            capacity,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Decomposition> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: CacheKey, value: Decomposition) {
        if self.capacity == 0 {
            return;
        }
        self.entries.insert(key.clone(), value);
        while self.entries.len() > self.capacity {
            // Take the key first; removing while iterating would deadlock the shard.
            let victim = self
                .entries
                .iter()
                .map(|entry| entry.key().clone())
                .find(|candidate| *candidate != key);
            match victim {
                Some(victim) => {
                    self.entries.remove(&victim);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -- Application state --------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub packs: PackSizeStore,
    pub cache: CalculationCache,

    /// PostgreSQL connection pool. When `None`, the API operates in
    /// in-memory-only mode.
    pub db_pool: Option<PgPool>,

    /// Prometheus scrape handle; `/metrics` is mounted only when present.
    pub metrics: Option<PrometheusHandle>,

    pub config: AppConfig,

    solve_permits: Arc<Semaphore>,
}

impl AppState {
    /// In-memory state seeded with the configured default pack sizes.
    pub fn new(config: AppConfig) -> Self {
        Self::with_pool(config, None)
    }

    pub fn with_pool(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let initial = config.default_pack_sizes.clone().map(ActiveConfiguration::new);
        Self {
            packs: PackSizeStore::new(initial),
            cache: CalculationCache::new(config.cache_capacity),
            db_pool,
            metrics: None,
            solve_permits: Arc::new(Semaphore::new(config.max_concurrent_solves.max(1))),
            config,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Load the active configuration from the database, or persist the
    /// default one when nothing is stored yet. No-op without a pool.
    pub async fn hydrate_from_db(&self) -> Result<(), AppError> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let stored = db::pack_configurations::get_active(pool).await?;
        match stored.map(|row| row.into_sizes()) {
            Some((id, Ok(sizes))) => {
                let active = build_configuration(sizes).await?.with_id(Some(id));
                tracing::info!(
                    configuration_id = id,
                    pack_sizes = ?active.sizes().to_vec(),
                    "hydrated pack sizes from database"
                );
                self.packs.install(active);
            }
            Some((id, Err(err))) => {
                tracing::warn!(
                    configuration_id = id,
                    error = %err,
                    "stored pack sizes are no longer valid; keeping defaults"
                );
                self.persist_current_default().await?;
            }
            None => self.persist_current_default().await?,
        }
        Ok(())
    }

    async fn persist_current_default(&self) -> Result<(), AppError> {
        if let Some(sizes) = self.packs.snapshot().map(|a| a.sizes().clone()) {
            self.replace_pack_sizes(sizes).await?;
        }
        Ok(())
    }

    /// Replace the whole pack-size configuration.
    pub async fn replace_pack_sizes(
        &self,
        sizes: PackSizeSet,
    ) -> Result<Arc<ActiveConfiguration>, AppError> {
        let active = build_configuration(sizes).await?;

        let _guard = self.packs.writer.lock().await;
        let id = match &self.db_pool {
            Some(pool) => Some(db::pack_configurations::activate(pool, active.sizes()).await?),
            None => None,
        };
        let active = self.packs.install(active.with_id(id));

        tracing::info!(
            configuration_id = ?active.id(),
            signature = %active.signature(),
            pack_sizes = ?active.sizes().to_vec(),
            "pack sizes replaced"
        );
        Ok(active)
    }

    /// Solve `order` against the active configuration, consulting the memory
    /// cache, then the database, then the optimizer.
    pub async fn calculate(&self, order: OrderQuantity) -> Result<Decomposition, AppError> {
        let active = self.packs.require()?;
        let key = CacheKey::new(active.signature(), order);

        let cached = self.cache.get(&key);
        metrics::record_cache_lookup(CacheSource::Memory, cached.is_some());
        if let Some(hit) = cached {
            tracing::debug!(order = order.get(), "calculation served from memory");
            return Ok(hit);
        }

        let persisted = persistence_key(&self.db_pool, &active, order);
        if let Some((pool, configuration_id, order_quantity)) = persisted {
            match db::order_calculations::find(pool, configuration_id, order_quantity).await {
                Ok(found) => {
                    metrics::record_cache_lookup(CacheSource::Database, found.is_some());
                    if let Some(hit) = found {
                        tracing::debug!(order = order.get(), "calculation served from database");
                        self.cache.insert(key, hit.clone());
                        return Ok(hit);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "calculation lookup failed; solving instead");
                }
            }
        }

        let permit = Arc::clone(&self.solve_permits)
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal("solve permits closed".to_string()))?;
        let started = Instant::now();
        let solver = Arc::clone(&active);
        let decomposition = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            solver.optimizer().solve(order)
        })
        .await??;
        metrics::record_optimizer_duration(started.elapsed());

        self.cache.insert(key, decomposition.clone());
        if let Some((pool, configuration_id, _)) = persisted {
            if let Err(err) = db::order_calculations::insert(pool, configuration_id, &decomposition).await {
                tracing::warn!(error = %err, "failed to persist calculation");
            }
        }

        Ok(decomposition)
    }
}

/// Build the optimizer off the async runtime; the residue table scales with
/// the largest pack size.
async fn build_configuration(sizes: PackSizeSet) -> Result<ActiveConfiguration, AppError> {
    Ok(tokio::task::spawn_blocking(move || ActiveConfiguration::new(sizes)).await?)
}

/// Pool, configuration id and order as stored, when the result can be persisted.
fn persistence_key<'a>(
    pool: &'a Option<PgPool>,
    active: &ActiveConfiguration,
    order: OrderQuantity,
) -> Option<(&'a PgPool, i64, i64)> {
    let pool = pool.as_ref()?;
    let id = active.id()?;
    let order = i64::try_from(order.get()).ok()?;
    Some((pool, id, order))
}
