//! # Archive Common Library
//!
//! Shared code for the archive tools including:
//! - Database initialization, models and queries
//! - Bootstrap configuration loading
//! - Common error types

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
