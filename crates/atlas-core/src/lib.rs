//! Atlas Core Library
//!
//! Domain types, error taxonomy, and port traits for the Atlas
//! country/currency reference mirror. Pure data and trait seams only;
//! the HTTP surface, SQLite store, and upstream client live in the
//! server crate.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{AtlasError, Result};
pub use ports::{CountryStore, MultiplierSource, NoopHook, RefreshHook};
pub use types::*;
