//! Database models and queries

pub mod collections;
pub mod init;
pub mod items;
pub mod models;
pub mod revisions;
pub mod users;

pub use init::{init_database, init_memory_database};
pub use models::*;
