//! Core domain types
//!
//! These types are shared between the API (which persists them) and the
//! client side (which reads them back over HTTP). None of them perform I/O.

pub mod class;
pub mod job;
pub mod quiz;
