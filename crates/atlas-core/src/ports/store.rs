//! Store trait for Country persistence

use crate::types::{Country, CountryUpsert, ListFilter};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Country record store, keyed by name.
///
/// Implementations are injected as `Arc<dyn CountryStore>` so the
/// reconciler, renderer, and handlers never touch a concrete engine.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Create the underlying schema if it does not exist. Idempotent.
    async fn ensure_schema(&self) -> Result<()>;

    /// Apply one refresh batch in a single transaction: every row is
    /// upserted by name with the shared `refreshed_at` timestamp, or
    /// none are. Returns the number of rows written.
    async fn upsert_all(
        &self,
        batch: &[CountryUpsert],
        refreshed_at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Exact-name lookup.
    async fn get(&self, name: &str) -> Result<Option<Country>>;

    /// Exact-name delete. Returns true when a row was removed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Filtered, optionally sorted scan.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Country>>;

    async fn count(&self) -> Result<i64>;

    /// Up to `limit` records ordered by estimated GDP descending.
    /// Null GDPs sort last (SQLite treats NULL as the smallest value).
    async fn top_by_gdp(&self, limit: i64) -> Result<Vec<Country>>;

    /// Connectivity probe, the `SELECT 1` equivalent.
    async fn probe(&self) -> Result<()>;

    /// Release the underlying connections.
    async fn close(&self);
}
