//! Storage layer
//!
//! Uses SQLite (embedded) instead of PostgreSQL for simplicity.

pub mod db;

pub use db::Database;
