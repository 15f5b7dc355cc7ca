//! Core types and configuration for the quantrank system.
//!
//! This crate provides shared types used across all other crates:
//! - Daily bars, market context and the scorer/predictor records
//! - Configuration structures with calibrated defaults
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
