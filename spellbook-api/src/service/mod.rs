//! Service Module
//!
//! Business logic layer. Services orchestrate the gateways and
//! repositories but own no state themselves.

pub mod class;
pub mod job;
pub mod review;

pub use class::{ClassError, ClassService};
pub use job::{JobError, JobService};
pub use review::{ReviewError, ReviewService};
