//! Core module - shared infrastructure for refill
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CoordinatorConfig, RefillConfig, ReplayConfig, StorageConfig};
pub use error::{RefillError, Result};
pub use types::*;
