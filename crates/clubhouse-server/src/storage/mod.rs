//! `SQLite` storage for the Clubhouse server.
//!
//! Provides persistence for users (with their premium profile), refresh
//! tokens, and premium requests.

mod db;
mod models;
mod queries;
mod queries_premium;


pub use db::{ClubhouseDatabase, DatabaseError};
pub use models::*;
pub use queries_premium::{Approval, NewPremiumRequest, ReviewError};
