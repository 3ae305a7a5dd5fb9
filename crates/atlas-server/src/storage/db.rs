//! SQLite database layer (embedded, no external dependencies)

use async_trait::async_trait;
use atlas_core::{
    AtlasError, Country, CountryStore, CountryUpsert, ListFilter, Result, SortKey,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, capital, region, population, currency_code, \
                       exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

pub struct Database {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> AtlasError {
    AtlasError::Database(e.to_string())
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        tracing::info!("SQLite connection established");

        let db = Self { pool };
        db.ensure_schema().await?;

        Ok(db)
    }

    /// Single-connection in-memory database, used by tests. One
    /// connection is mandatory: SQLite gives every new connection its
    /// own private `:memory:` database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let db = Self { pool };
        db.ensure_schema().await?;

        Ok(db)
    }
}

#[async_trait]
impl CountryStore for Database {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                capital TEXT,
                region TEXT,
                population INTEGER NOT NULL DEFAULT 0,
                currency_code TEXT,
                exchange_rate REAL,
                estimated_gdp REAL,
                flag_url TEXT,
                last_refreshed_at DATETIME
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn upsert_all(
        &self,
        batch: &[CountryUpsert],
        refreshed_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for record in batch {
            sqlx::query(
                r#"
                INSERT INTO countries
                    (name, capital, region, population, currency_code,
                     exchange_rate, estimated_gdp, flag_url, last_refreshed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(name) DO UPDATE SET
                    capital = excluded.capital,
                    region = excluded.region,
                    population = excluded.population,
                    currency_code = excluded.currency_code,
                    exchange_rate = excluded.exchange_rate,
                    estimated_gdp = excluded.estimated_gdp,
                    flag_url = excluded.flag_url,
                    last_refreshed_at = excluded.last_refreshed_at
                "#,
            )
            .bind(&record.name)
            .bind(&record.capital)
            .bind(&record.region)
            .bind(record.population)
            .bind(&record.currency_code)
            .bind(record.exchange_rate)
            .bind(record.estimated_gdp)
            .bind(&record.flag_url)
            .bind(refreshed_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(batch.len() as u64)
    }

    async fn get(&self, name: &str) -> Result<Option<Country>> {
        let sql = format!("SELECT {COLUMNS} FROM countries WHERE name = ?1");
        let row: Option<CountryRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Country>> {
        let mut sql = format!("SELECT {COLUMNS} FROM countries");
        let mut clauses = Vec::new();

        if filter.region.is_some() {
            clauses.push("LOWER(region) LIKE '%' || LOWER(?) || '%'");
        }
        if filter.currency.is_some() {
            clauses.push("currency_code = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        match filter.sort {
            Some(SortKey::GdpDesc) => sql.push_str(" ORDER BY estimated_gdp DESC"),
            Some(SortKey::GdpAsc) => sql.push_str(" ORDER BY estimated_gdp ASC"),
            Some(SortKey::PopulationDesc) => sql.push_str(" ORDER BY population DESC"),
            Some(SortKey::PopulationAsc) => sql.push_str(" ORDER BY population ASC"),
            // Default ordering: insertion (rowid) order, stable within a call.
            None => {}
        }

        let mut query = sqlx::query_as::<_, CountryRow>(&sql);
        if let Some(region) = &filter.region {
            query = query.bind(region);
        }
        if let Some(currency) = &filter.currency {
            query = query.bind(currency);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(total)
    }

    async fn top_by_gdp(&self, limit: i64) -> Result<Vec<Country>> {
        // SQLite treats NULL as smaller than any value, so DESC puts
        // rows with no computable GDP last.
        let sql =
            format!("SELECT {COLUMNS} FROM countries ORDER BY estimated_gdp DESC LIMIT ?1");
        let rows: Vec<CountryRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn probe(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    capital: Option<String>,
    region: Option<String>,
    population: i64,
    currency_code: Option<String>,
    exchange_rate: Option<f64>,
    estimated_gdp: Option<f64>,
    flag_url: Option<String>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

impl From<CountryRow> for Country {
    fn from(r: CountryRow) -> Self {
        Country {
            id: r.id,
            name: r.name,
            capital: r.capital,
            region: r.region,
            population: r.population,
            currency_code: r.currency_code,
            exchange_rate: r.exchange_rate,
            estimated_gdp: r.estimated_gdp,
            flag_url: r.flag_url,
            last_refreshed_at: r.last_refreshed_at,
        }
    }
}
