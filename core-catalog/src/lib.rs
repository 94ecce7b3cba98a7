//! # Catalog Storage Module
//!
//! Owns the local mirror of the 1C catalogs and provides repository patterns
//! for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repository patterns for nomenclature, types, manufacturers, units,
//!   prices and stock levels
//! - The append-only sync log with per-run counters
//! - Versioned site settings documents (latest wins)

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{CatalogError, Result};
