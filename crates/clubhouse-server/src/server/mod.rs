//! gRPC server implementations for Clubhouse.

pub mod admin_svc;
pub mod auth_svc;
mod convert;
pub mod interceptor;
pub mod premium_svc;

#[cfg(test)]
mod admin_svc_tests;
#[cfg(test)]
mod auth_svc_tests;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use admin_svc::PremiumAdminServiceImpl;
pub use auth_svc::AuthServiceImpl;
pub use interceptor::jwt_interceptor;
pub use premium_svc::PremiumServiceImpl;
