//! HTTP service implementations.

mod profiles;

pub use profiles::{ProfileFields, ProfileService, router as profile_routes};

#[cfg(test)]
pub(crate) use profiles::testing;
