//! Data Transfer Objects
//!
//! Request and response bodies of the HTTP API. Field names are camelCase
//! on the wire.

pub mod class;
pub mod error;
pub mod job;
