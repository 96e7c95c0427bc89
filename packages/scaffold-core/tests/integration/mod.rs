//! Integration test suite.
//!
//! 1. Customer create/edit flow through forms, repository and sessions
//! 2. Snapshot persistence across database reopen
//! 3. Schema files and configuration

pub mod customer_flow_tests;
pub mod helpers;
pub mod persistence_tests;
pub mod schema_file_tests;
