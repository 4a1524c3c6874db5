//! Environment lookup and configuration assembly.
//!
//! # Design
//! - Read every variable exactly once at start-up; nothing re-reads the environment later.
//! - Lookups go through [`EnvLookup`] so tests can supply a map instead of mutating process state.
//! - Blank values are treated as absent.
//! - A `.env` file, when one is found, fills in variables the process environment leaves unset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    CloudinaryConfig, CredentialConfig, LogFormatSetting, PollSettings, Secret, ServerConfig,
    ServiceConfig, SignatureAlgorithm, StagingConfig, VertexConfig,
};
use crate::validate::{
    parse_base_url, parse_bind_addr, parse_identifier, parse_port, parse_positive_u32,
    parse_positive_u64,
};

/// Source of environment variables.
pub trait EnvLookup {
    /// Return the raw value for `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Lookup backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Variables read from a `.env` file.
///
/// The process environment always wins; file entries only fill gaps.
#[derive(Debug, Clone, Default)]
pub struct DotenvFile {
    vars: HashMap<String, String>,
}

impl DotenvFile {
    /// Read the nearest `.env`, searching the working directory and its parents.
    ///
    /// A missing file yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvFile`] when a file exists but cannot be read or parsed.
    pub fn discover() -> ConfigResult<Self> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => Self::collect(iter),
            Err(err) if err.not_found() => {
                debug!("no .env file found; using process environment only");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::EnvFile { source }),
        }
    }

    /// Read the `.env` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvFile`] when the file is missing, unreadable or malformed.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        dotenvy::from_path_iter(path)
            .map_err(|source| ConfigError::EnvFile { source })
            .and_then(Self::collect)
    }

    fn collect(
        iter: impl Iterator<Item = Result<(String, String), dotenvy::Error>>,
    ) -> ConfigResult<Self> {
        let vars = iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|source| ConfigError::EnvFile { source })?;
        debug!(entries = vars.len(), "loaded .env file");
        Ok(Self { vars })
    }

    /// Lookup that consults `primary` first and this file second.
    #[must_use]
    pub fn beneath<'a, E: EnvLookup>(&'a self, primary: &'a E) -> impl EnvLookup + 'a {
        move |name: &str| primary.var(name).or_else(|| self.vars.get(name).cloned())
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment and an optional `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error when the `.env` file is malformed, a required variable is
    /// missing or a value fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        let dotenv = DotenvFile::discover()?;
        Self::from_lookup(&dotenv.beneath(&ProcessEnv))
    }

    /// Load configuration from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails validation.
    pub fn from_lookup(env: &impl EnvLookup) -> ConfigResult<Self> {
        let server = load_server(env)?;
        let vertex = load_vertex(env)?;
        let credentials = load_credentials(env);
        let cloudinary = load_cloudinary(env)?;
        let poll = load_poll(env)?;
        let staging = StagingConfig {
            dir: optional(env, "REELSMITH_STAGING_DIR").map_or_else(std::env::temp_dir, PathBuf::from),
        };
        let http_timeout = Duration::from_secs(
            optional(env, "REELSMITH_HTTP_TIMEOUT_SECS")
                .map(|value| parse_positive_u64("REELSMITH_HTTP_TIMEOUT_SECS", &value))
                .transpose()?
                .unwrap_or(defaults::HTTP_TIMEOUT_SECS),
        );
        let log_format = optional(env, "REELSMITH_LOG_FORMAT")
            .map(|value| parse_log_format(&value))
            .transpose()?;

        let config = Self {
            server,
            vertex,
            credentials,
            cloudinary,
            poll,
            staging,
            http_timeout,
            log_format,
        };
        debug!(
            project = %config.vertex.project,
            location = %config.vertex.location,
            model = %config.vertex.model,
            "configuration loaded"
        );
        Ok(config)
    }
}

fn load_server(env: &impl EnvLookup) -> ConfigResult<ServerConfig> {
    let port = optional(env, "PORT")
        .map(|value| parse_port("PORT", &value))
        .transpose()?
        .unwrap_or(defaults::HTTP_PORT);
    let bind_addr = optional(env, "BIND_ADDR")
        .map(|value| parse_bind_addr("BIND_ADDR", &value))
        .transpose()?
        .unwrap_or(defaults::BIND_ADDR);
    Ok(ServerConfig { bind_addr, port })
}

fn load_vertex(env: &impl EnvLookup) -> ConfigResult<VertexConfig> {
    let project = parse_identifier("GCLOUD_PROJECT", &required(env, "GCLOUD_PROJECT")?)?;
    let location = parse_identifier("GCLOUD_LOCATION", &required(env, "GCLOUD_LOCATION")?)?;
    let model = parse_identifier("GCLOUD_MODEL", &required(env, "GCLOUD_MODEL")?)?;
    let base_url = match optional(env, "VERTEX_BASE_URL") {
        Some(value) => parse_base_url("VERTEX_BASE_URL", &value)?,
        None => defaults::vertex_base_url(&location),
    };
    Ok(VertexConfig {
        project,
        location,
        model,
        base_url,
    })
}

fn load_credentials(env: &impl EnvLookup) -> CredentialConfig {
    CredentialConfig {
        static_token: optional(env, "GOOGLE_ACCESS_TOKEN").map(Secret::new),
        credentials_file: optional(env, "GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
        gcloud_bin: optional(env, "GCLOUD_BIN").unwrap_or_else(|| defaults::GCLOUD_BIN.to_string()),
    }
}

fn load_cloudinary(env: &impl EnvLookup) -> ConfigResult<CloudinaryConfig> {
    let cloud_name = parse_identifier(
        "CLOUDINARY_CLOUD_NAME",
        &required(env, "CLOUDINARY_CLOUD_NAME")?,
    )?;
    let api_key = required(env, "CLOUDINARY_API_KEY")?;
    let api_secret = Secret::new(required(env, "CLOUDINARY_API_SECRET")?);
    let base_url = match optional(env, "CLOUDINARY_BASE_URL") {
        Some(value) => parse_base_url("CLOUDINARY_BASE_URL", &value)?,
        None => defaults::CLOUDINARY_BASE_URL.to_string(),
    };
    let signature_algorithm = match optional(env, "CLOUDINARY_SIGNATURE_ALGORITHM") {
        Some(value) => {
            SignatureAlgorithm::parse(&value).ok_or_else(|| ConfigError::InvalidField {
                field: "CLOUDINARY_SIGNATURE_ALGORITHM",
                value: Some(value.clone()),
                reason: "unsupported_algorithm",
            })?
        }
        None => SignatureAlgorithm::Sha1,
    };
    Ok(CloudinaryConfig {
        cloud_name,
        api_key,
        api_secret,
        base_url,
        folder: optional(env, "CLOUDINARY_FOLDER")
            .unwrap_or_else(|| defaults::CLOUDINARY_FOLDER.to_string()),
        resource_type: defaults::CLOUDINARY_RESOURCE_TYPE.to_string(),
        signature_algorithm,
    })
}

fn load_poll(env: &impl EnvLookup) -> ConfigResult<PollSettings> {
    let base_delay_ms = optional(env, "REELSMITH_POLL_BASE_DELAY_MS")
        .map(|value| parse_positive_u64("REELSMITH_POLL_BASE_DELAY_MS", &value))
        .transpose()?
        .unwrap_or(defaults::POLL_BASE_DELAY_MS);
    let max_attempts = optional(env, "REELSMITH_POLL_MAX_ATTEMPTS")
        .map(|value| parse_positive_u32("REELSMITH_POLL_MAX_ATTEMPTS", &value))
        .transpose()?
        .unwrap_or(defaults::POLL_MAX_ATTEMPTS);
    Ok(PollSettings {
        base_delay: Duration::from_millis(base_delay_ms),
        max_attempts,
    })
}

fn parse_log_format(value: &str) -> ConfigResult<LogFormatSetting> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormatSetting::Json),
        "pretty" => Ok(LogFormatSetting::Pretty),
        _ => Err(ConfigError::InvalidField {
            field: "REELSMITH_LOG_FORMAT",
            value: Some(value.to_string()),
            reason: "unsupported_format",
        }),
    }
}

fn optional(env: &impl EnvLookup, name: &str) -> Option<String> {
    env.var(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(env: &impl EnvLookup, name: &'static str) -> ConfigResult<String> {
    optional(env, name).ok_or(ConfigError::MissingField { name })
}
