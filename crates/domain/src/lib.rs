//! Shared types for the Sentinel crawl node: the error type and the
//! configuration tree.

pub mod config;
pub mod error;

pub use error::{Error, Result};
