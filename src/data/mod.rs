//! Data layer
//!
//! Database access and data models.

pub mod database;
pub mod models;

pub use database::Database;
