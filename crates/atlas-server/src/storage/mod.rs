//! Storage layer
//!
//! Uses SQLite (embedded, no external dependencies) behind the
//! `CountryStore` port.

pub mod db;

pub use db::Database;
