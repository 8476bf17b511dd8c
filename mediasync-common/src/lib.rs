//! # mediasync Common Library
//!
//! Shared code for the mediasync binaries:
//! - Error types and exit-code mapping
//! - Layered configuration (CLI, environment, TOML, defaults)
//! - Video record model and store row shape
//! - ISO-8601 duration parsing
//! - Channel feed extraction
//! - HTTP clients for the feed host, metadata API and store
//! - Duration merge and filter
//! - Logging setup

pub mod config;
pub mod duration;
pub mod error;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{Error, Result};
