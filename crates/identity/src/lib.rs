//! Identity verification against the external auth provider.
//!
//! The service never authenticates anyone itself. It only asks the provider
//! whether an account with a given id exists.

mod toolkit;

use async_trait::async_trait;

pub use toolkit::{IdentityToolkit, IdentityToolkitConfig};

/// Account data returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub disabled: bool,
}

/// Confirms that an identifier belongs to a real account.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Look up `uid` without any local validation.
    ///
    /// Every failure, including an unreachable provider, yields `None`.
    async fn verify(&self, uid: &str) -> Option<Account>;
}
