//! Access token sources for the generation provider.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reelsmith_config::CredentialConfig;
use reelsmith_core::{AccessToken, CredentialError, CredentialProvider};
use tokio::process::Command;
use tracing::{debug, info};

const GCLOUD_PROVIDER: &str = "gcloud";
const STATIC_PROVIDER: &str = "static";
const CREDENTIAL_FILE_OVERRIDE: &str = "CLOUDSDK_AUTH_CREDENTIAL_FILE_OVERRIDE";

/// Pick the token source described by `config`.
///
/// A configured static token wins; otherwise the gcloud CLI is used.
#[must_use]
pub fn credential_provider(config: &CredentialConfig) -> Arc<dyn CredentialProvider> {
    if let Some(token) = &config.static_token {
        info!("using static access token");
        return Arc::new(StaticTokenCredentials::new(token.expose()));
    }
    info!(bin = %config.gcloud_bin, "using gcloud CLI for access tokens");
    Arc::new(GcloudCliCredentials::new(
        config.gcloud_bin.clone(),
        config.credentials_file.clone(),
    ))
}

/// Hands out a fixed token.
#[derive(Clone)]
pub struct StaticTokenCredentials {
    token: AccessToken,
}

impl StaticTokenCredentials {
    /// Wrap `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredentials {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        if self.token.expose().trim().is_empty() {
            return Err(CredentialError::Empty {
                provider: STATIC_PROVIDER,
            });
        }
        Ok(self.token.clone())
    }
}

/// Runs `gcloud auth print-access-token` for every request.
#[derive(Debug, Clone)]
pub struct GcloudCliCredentials {
    program: String,
    credentials_file: Option<PathBuf>,
}

impl GcloudCliCredentials {
    /// Use `program` as the gcloud binary, optionally pinned to a credentials file.
    #[must_use]
    pub fn new(program: impl Into<String>, credentials_file: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            credentials_file,
        }
    }
}

#[async_trait]
impl CredentialProvider for GcloudCliCredentials {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        let mut command = Command::new(&self.program);
        command.args(["auth", "print-access-token"]).kill_on_drop(true);
        if let Some(path) = &self.credentials_file {
            command.env(CREDENTIAL_FILE_OVERRIDE, path);
        }

        let output = command
            .output()
            .await
            .map_err(|err| CredentialError::Unavailable {
                provider: GCLOUD_PROVIDER,
                source: Box::new(err),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CredentialError::Rejected {
                provider: GCLOUD_PROVIDER,
                detail: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(CredentialError::Empty {
                provider: GCLOUD_PROVIDER,
            });
        }
        debug!("access token obtained from gcloud");
        Ok(AccessToken::new(token))
    }
}
