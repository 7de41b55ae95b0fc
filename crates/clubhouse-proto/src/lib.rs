//! Clubhouse Protocol Buffers
//!
//! Generated protobuf code for the Clubhouse gRPC API.
//!
//! This crate contains:
//! - `AuthService` for registration, login and token rotation
//! - `PremiumService` for member-facing premium requests
//! - `PremiumAdminService` for reviewing premium requests

#![allow(clippy::derive_partial_eq_without_eq)]

/// Clubhouse v1 API definitions.
pub mod v1 {
    tonic::include_proto!("clubhouse.v1");
}

pub use v1::*;

pub use prost_types;
