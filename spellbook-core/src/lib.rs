//! Spellbook Core
//!
//! Core types shared by the Spellbook API, client and CLI.
//!
//! This crate contains:
//! - Domain types: jobs, scores, quizzes, classes and notes
//! - DTOs: request and response bodies of the HTTP API

pub mod domain;
pub mod dto;
