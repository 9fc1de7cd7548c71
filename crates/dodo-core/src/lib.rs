//! dodo-core: models, storage and business rules for the dodo task tracker.
//!
//! # Conventions
//!
//! - **Errors**: repositories return `anyhow::Result` with context on every
//!   SQLite call; services return [`error::Result`] with a stable
//!   [`error::ErrorCode`].
//! - **Logging**: `tracing` macros with structured fields.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod repo;
pub mod service;
pub mod validate;

pub use error::{Error, ErrorCode, Result};
