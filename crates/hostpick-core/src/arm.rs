//! Authenticated Azure Resource Manager requests.
//!
//! A thin pass-through: get a bearer token from a [`TokenCredential`], attach
//! it with a JSON content type, send the request, and hand back the raw
//! response. No retries and no body buffering; the first failure at any
//! stage is returned.
//!
//! # Example
//!
//! ```no_run
//! use hostpick_core::arm::{ArmClient, AzureCliCredential, Method};
//!
//! let credential = AzureCliCredential::new();
//! let response = ArmClient::new(&credential).send(
//!     Method::GET,
//!     "https://management.azure.com/subscriptions?api-version=2022-12-01",
//!     String::new(),
//! )?;
//! println!("{}", response.status());
//! # Ok::<(), hostpick_core::arm::ArmError>(())
//! ```

use std::fmt;
use std::process::Command;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

pub use reqwest::Method;

/// Token scope for the Azure management plane.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Errors from acquiring a token.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The credential's tool is not installed.
    #[error("`{0}` not found on PATH")]
    NotInstalled(String),

    /// The credential's tool could not be started.
    #[error("failed to run `{binary}`: {source}")]
    Spawn {
        /// Tool that failed to start.
        binary: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The credential's tool ran but refused to issue a token.
    #[error("`{binary}` exited with {status}: {stderr}")]
    Failed {
        /// Tool that failed.
        binary: String,
        /// Exit status description.
        status: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The token response could not be parsed.
    #[error("unexpected token response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from [`ArmClient::send`].
#[derive(Error, Debug)]
pub enum ArmError {
    /// No token could be acquired.
    #[error("failed to get token from credentials: {0}")]
    Credential(#[from] CredentialError),

    /// The request could not be built (e.g. malformed URL).
    #[error("failed to create http request: {0}")]
    Request(#[source] reqwest::Error),

    /// The request failed in transport.
    #[error("failed to send http request: {0}")]
    Send(#[source] reqwest::Error),
}

/// A bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token itself.
    pub token: String,
    /// Expiry as reported by the issuer, if any.
    pub expires_on: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens.
pub trait TokenCredential {
    /// Acquire a token valid for `scopes`.
    fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError>;
}

/// Credential that always yields the same pre-acquired token.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticTokenCredential(<redacted>)")
    }
}

impl TokenCredential for StaticTokenCredential {
    fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

/// Credential backed by the Azure CLI's signed-in account.
///
/// Runs `az account get-access-token --output json --scope <scopes...>`.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    binary: String,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureCliCredential {
    /// Use `az` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary("az")
    }

    /// Use a specific Azure CLI binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    expires_on: Option<String>,
}

fn parse_token_response(stdout: &[u8]) -> Result<AccessToken, CredentialError> {
    let response: CliTokenResponse = serde_json::from_slice(stdout)?;
    Ok(AccessToken {
        token: response.access_token,
        expires_on: response.expires_on,
    })
}

impl TokenCredential for AzureCliCredential {
    #[instrument(skip(self), fields(binary = %self.binary))]
    fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        let path = which::which(&self.binary)
            .map_err(|_| CredentialError::NotInstalled(self.binary.clone()))?;

        let output = Command::new(path)
            .args(["account", "get-access-token", "--output", "json", "--scope"])
            .args(scopes)
            .output()
            .map_err(|source| CredentialError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CredentialError::Failed {
                binary: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let token = parse_token_response(&output.stdout)?;
        debug!(expires_on = ?token.expires_on, "acquired token");
        Ok(token)
    }
}

/// Sends management-plane requests with a bearer token attached.
pub struct ArmClient<'a, T: ?Sized> {
    credential: &'a T,
    http: Client,
    scope: String,
}

impl<'a, T: TokenCredential + ?Sized> ArmClient<'a, T> {
    /// Client using [`MANAGEMENT_SCOPE`] and a default HTTP client.
    pub fn new(credential: &'a T) -> Self {
        Self {
            credential,
            http: Client::new(),
            scope: MANAGEMENT_SCOPE.to_string(),
        }
    }

    /// Request tokens for a different scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Send `body` to `url` with `method`, returning the raw response.
    ///
    /// Non-success HTTP statuses are not errors; inspect the response.
    #[instrument(skip(self, body), fields(scope = %self.scope))]
    pub fn send(&self, method: Method, url: &str, body: String) -> Result<Response, ArmError> {
        let token = self
            .credential
            .get_token(&[self.scope.as_str()])
            .inspect_err(|e| error!(error = %e, "failed to get token from credentials"))?;

        let request = self
            .http
            .request(method, url)
            .bearer_auth(&token.token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(|e| {
                error!(error = %e, "failed to create http request");
                ArmError::Request(e)
            })?;

        let response = self.http.execute(request).map_err(|e| {
            error!(error = %e, "failed to send http request");
            ArmError::Send(e)
        })?;
        debug!(status = %response.status(), "arm request completed");
        Ok(response)
    }
}

/// Send one authenticated request with a fresh [`ArmClient`].
pub fn send_raw_arm_request<T: TokenCredential + ?Sized>(
    credential: &T,
    method: Method,
    url: &str,
    body: String,
) -> Result<Response, ArmError> {
    ArmClient::new(credential).send(method, url, body)
}
