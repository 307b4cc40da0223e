//! # FOURplay Common Library
//!
//! Shared code for the FOURplay microservices including:
//! - Error types
//! - TOML bootstrap configuration loading
//! - Provider credential resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
