//! Spellbook API server
//!
//! Quiz-generation jobs are enqueued for an external worker, which writes
//! one result object per job. Clients poll the status endpoint until the
//! object exists and then fetch it once.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod gateway;
pub mod llm;
pub mod repository;
pub mod service;
