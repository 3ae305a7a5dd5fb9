//! Country types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted country record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    /// `population * multiplier / exchange_rate`, with the multiplier
    /// drawn per country per refresh. `Some(0.0)` when the country has
    /// no currency list at all; `None` when a currency code exists but
    /// has no entry in the rate map.
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// The fields a refresh writes. The store assigns `id` on first insert
/// and keeps it stable across upserts; the caller supplies one shared
/// refresh timestamp for the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryUpsert {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

/// Sort order for country listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    GdpDesc,
    GdpAsc,
    PopulationDesc,
    PopulationAsc,
}

impl SortKey {
    /// Parse a query-string value. Unrecognized values yield `None`,
    /// which leaves the store's default ordering in place.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gdp_desc" => Some(SortKey::GdpDesc),
            "gdp_asc" => Some(SortKey::GdpAsc),
            "population_desc" => Some(SortKey::PopulationDesc),
            "population_asc" => Some(SortKey::PopulationAsc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::GdpDesc => write!(f, "gdp_desc"),
            SortKey::GdpAsc => write!(f, "gdp_asc"),
            SortKey::PopulationDesc => write!(f, "population_desc"),
            SortKey::PopulationAsc => write!(f, "population_asc"),
        }
    }
}

/// Filters and ordering for `CountryStore::list`. Filters are
/// independently optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring match against the stored region.
    pub region: Option<String>,
    /// Exact match against the currency code.
    pub currency: Option<String>,
    pub sort: Option<SortKey>,
}
