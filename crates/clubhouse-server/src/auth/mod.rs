//! Authentication for the Clubhouse server.
//!
//! Provides JWT token management, password hashing, and the caller
//! `Identity` handed to the premium workflow.

pub mod claims;
pub mod identity;
pub mod jwt;
pub mod password;

pub use claims::{Claims, TokenKind};
pub use identity::Identity;
pub use jwt::{IssuedToken, JwtManager, Subject};
