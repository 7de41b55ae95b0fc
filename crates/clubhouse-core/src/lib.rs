//! Clubhouse Core Library
//!
//! Shared functionality for Clubhouse components:
//! - Premium subscription lifecycle rules (status, expiry extension)
//! - Configuration resolution and hierarchy
//! - `SQLite` pool helpers
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod premium;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use premium::{RequestState, RequestStatus};
