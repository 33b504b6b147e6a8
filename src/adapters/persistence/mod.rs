//! Persistence adapters. libsql (SQLite) implementation of every storage port.

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
