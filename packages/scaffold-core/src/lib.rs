//! Core of the CRUD scaffolding.
//!
//! Provides record type metadata, a schema-first record store with
//! unit-of-work sessions, repositories, database configuration and
//! metadata-driven form synthesis.

pub mod config;
pub mod error;
pub mod forms;
pub mod naming;
pub mod persistence;
pub mod repository;
pub mod schema;
pub mod store;

pub use error::ScaffoldError;
