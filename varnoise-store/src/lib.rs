//! # Storage backends for varnoise.
//!
//! [`SqliteStore`] persists aggregates and the sample registry in a single
//! SQLite file. [`VarNoiseConfig`] reads the YAML config that selects a backend.
//!
pub mod config;
pub mod sqlite;

pub use config::*;
pub use sqlite::SqliteStore;
