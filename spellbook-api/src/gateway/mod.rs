//! Gateway Module
//!
//! Thin adapters over the two external collaborators of the job protocol:
//! the object store holding notes and results, and the queue feeding the
//! external quiz worker. Each gateway is a trait with a production backend
//! and an in-memory backend.

pub mod fs;
pub mod memory;
pub mod object_store;
pub mod queue;
pub mod signing;

pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object_store::{ObjectStore, StoreError};
pub use queue::{InMemoryJobQueue, JobQueue, PgJobQueue, QueueError};
pub use signing::{SignatureError, SignedMethod, UrlSigner};
