//! Identity Toolkit admin API client (`accounts:lookup`).
//!
//! # Configuration
//!
//! Environment variables (read by the service binary):
//! - `IDENTITY_URL` - API base URL, defaults to [`IdentityToolkitConfig::DEFAULT_BASE_URL`]
//! - `IDENTITY_PROJECT_ID` - Project that owns the accounts
//! - `IDENTITY_ACCESS_TOKEN` - OAuth bearer token with admin scope

use std::time::Duration;

use async_trait::async_trait;
use profile_core::{AppError, InternalExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{Account, IdentityVerifier};

/// Identity Toolkit client configuration.
#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    pub base_url: String,
    pub project_id: String,
    pub access_token: SecretString,
    pub timeout: Duration,
}

impl IdentityToolkitConfig {
    pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    fn lookup_url(&self) -> String {
        format!(
            "{}/projects/{}/accounts:lookup",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// Identity Toolkit-backed [`IdentityVerifier`].
#[derive(Clone)]
pub struct IdentityToolkit {
    client: Client,
    lookup_url: String,
    access_token: SecretString,
}

impl std::fmt::Debug for IdentityToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkit")
            .field("lookup_url", &self.lookup_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    #[serde(rename = "localId")]
    local_id: [&'a str; 1],
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    disabled: bool,
}

impl From<UserRecord> for Account {
    fn from(record: UserRecord) -> Self {
        Self {
            uid: record.local_id,
            email: record.email,
            display_name: record.display_name,
            disabled: record.disabled,
        }
    }
}

impl IdentityToolkit {
    /// Create a new Identity Toolkit client.
    pub fn new(config: &IdentityToolkitConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .internal("Failed to create HTTP client")?;

        let lookup_url = config.lookup_url();
        info!(url = %lookup_url, "Identity Toolkit client initialized");

        Ok(Self {
            client,
            lookup_url,
            access_token: config.access_token.clone(),
        })
    }

    async fn lookup(&self, uid: &str) -> Result<Option<Account>, reqwest::Error> {
        let response = self
            .client
            .post(&self.lookup_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&LookupRequest { local_id: [uid] })
            .send()
            .await?
            .error_for_status()?;

        let body: LookupResponse = response.json().await?;

        Ok(body
            .users
            .into_iter()
            .find(|user| user.local_id == uid)
            .map(Account::from))
    }
}

#[async_trait]
impl IdentityVerifier for IdentityToolkit {
    #[instrument(skip(self))]
    async fn verify(&self, uid: &str) -> Option<Account> {
        match self.lookup(uid).await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                debug!("Account not found");
                None
            }
            Err(e) => {
                warn!(error = %e, "Account lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const LOOKUP_PATH: &str = "/projects/demo/accounts:lookup";

    fn toolkit(server: &MockServer) -> IdentityToolkit {
        IdentityToolkit::new(&IdentityToolkitConfig {
            base_url: server.uri(),
            project_id: "demo".into(),
            access_token: SecretString::from("token"),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn lookup_url_trims_trailing_slash() {
        let config = IdentityToolkitConfig {
            base_url: "https://example.com/v1/".into(),
            project_id: "demo".into(),
            access_token: SecretString::from("token"),
            timeout: IdentityToolkitConfig::DEFAULT_TIMEOUT,
        };
        assert_eq!(
            config.lookup_url(),
            "https://example.com/v1/projects/demo/accounts:lookup"
        );
    }

    #[tokio::test]
    async fn verify_returns_existing_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .and(header("authorization", "Bearer token"))
            .and(body_json(json!({ "localId": ["u1"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{
                    "localId": "u1",
                    "email": "ann@example.com",
                    "displayName": "Ann",
                    "disabled": false
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let account = toolkit(&server).verify("u1").await.unwrap();
        assert_eq!(account.uid, "u1");
        assert_eq!(account.email.as_deref(), Some("ann@example.com"));
        assert_eq!(account.display_name.as_deref(), Some("Ann"));
        assert!(!account.disabled);
    }

    #[tokio::test]
    async fn verify_returns_none_when_no_users() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "lookup" })))
            .mount(&server)
            .await;

        assert!(toolkit(&server).verify("ghost").await.is_none());
    }

    #[tokio::test]
    async fn verify_collapses_provider_errors_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "INVALID_ID" }
            })))
            .mount(&server)
            .await;

        assert!(toolkit(&server).verify("").await.is_none());
    }

    #[tokio::test]
    async fn verify_collapses_malformed_body_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(toolkit(&server).verify("u1").await.is_none());
    }

    #[tokio::test]
    async fn verify_ignores_mismatched_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "localId": "someone-else" }]
            })))
            .mount(&server)
            .await;

        assert!(toolkit(&server).verify("u1").await.is_none());
    }
}
