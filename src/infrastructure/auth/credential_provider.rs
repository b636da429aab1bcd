use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::{AwsCredentials, SigV4Signer};
use crate::presentation::config::{AuthMode, AuthSettings};

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

/// How outgoing requests to managed services are authenticated.
///
/// Chosen once at startup: plain credentials against a local deployment,
/// SigV4-signed requests against the managed one.
#[derive(Debug, Clone)]
pub enum CredentialProvider {
    Static(StaticCredentials),
    SignedRequest(SigV4Signer),
}

#[derive(Clone)]
pub struct StaticCredentials {
    pub username: String,
    pub password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl CredentialProvider {
    /// Basic auth with the given user (falling back to `admin:admin`) in
    /// static mode; SigV4 with credentials from the environment in signed mode.
    pub fn from_settings(
        auth: &AuthSettings,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, AuthError> {
        match auth.mode {
            AuthMode::Static => Ok(CredentialProvider::Static(StaticCredentials::new(
                username.unwrap_or(DEFAULT_USERNAME),
                password.unwrap_or(DEFAULT_PASSWORD),
            ))),
            AuthMode::Signed => Ok(CredentialProvider::SignedRequest(SigV4Signer::new(
                AwsCredentials::from_env()?,
                auth.region.clone(),
                auth.service.clone(),
            ))),
        }
    }

    pub fn authorize(&self, request: &mut reqwest::Request) -> Result<(), AuthError> {
        match self {
            CredentialProvider::Static(credentials) => {
                let token =
                    STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
                let value = HeaderValue::from_str(&format!("Basic {}", token))
                    .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
                request.headers_mut().insert(AUTHORIZATION, value);
                Ok(())
            }
            CredentialProvider::SignedRequest(signer) => signer.sign(request),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            CredentialProvider::Static(_) => "static",
            CredentialProvider::SignedRequest(_) => "signed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credential: {0}")]
    MissingCredentials(String),
    #[error("request has no host")]
    MissingHost,
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("signing failed: {0}")]
    Signing(String),
}
