//! Clubhouse Server Library
//!
//! Core functionality for the Clubhouse membership server:
//! - SQLite storage for users, refresh tokens, and premium requests
//! - JWT authentication and password hashing
//! - Blob storage for payment proofs
//! - The premium submission and review workflow
//! - gRPC services (Auth, Premium, PremiumAdmin)

pub mod auth;
pub mod blob;
pub mod premium;
pub mod server;
pub mod storage;
