//! Premium subscription lifecycle rules.
//!
//! A premium request moves through a three-state flow:
//!
//! ```text
//!   (submit) --> Pending --approve--> Approved
//!                        \--reject--> Rejected
//! ```
//!
//! Both resolved states are terminal. Approval extends the member's
//! `premium_until`; active time stacks instead of resetting from "now".

mod expiry;
mod status;

pub use expiry::{DEFAULT_EXTENSION_MONTHS, extend_premium, is_premium_active};
pub use status::{RequestState, RequestStatus};
