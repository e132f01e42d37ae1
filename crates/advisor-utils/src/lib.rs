//! Shared utilities for the stock advisor
//!
//! This crate provides the ambient plumbing used across the workspace:
//! tracing initialization and secret resolution (hosted secrets file,
//! `.env`, or the process environment).

pub mod logging;
pub mod secrets;

pub use logging::init_tracing;
pub use secrets::{SecretError, SecretStore};
