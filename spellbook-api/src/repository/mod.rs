//! Repository Module
//!
//! Data access layer. Each repository is a trait with a PostgreSQL
//! implementation and an in-memory one.

pub mod class;
pub mod job;
pub mod memory;

pub use class::{ClassRepository, PgClassRepository};
pub use job::{JobRecordStore, PgJobRecordStore, RecordStoreError, ScoreStats};
pub use memory::{InMemoryClassRepository, InMemoryJobRecordStore};
