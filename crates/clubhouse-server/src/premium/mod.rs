//! Premium subscription workflow.
//!
//! Every operation takes the caller's [`Identity`](crate::auth::Identity)
//! explicitly; nothing here reads ambient session state.

mod error;
mod service;
mod validate;


pub use error::PremiumError;
pub use service::{LatestRequest, PremiumWorkflow, Profile};
pub use validate::{BankDetails, ProofUpload};
