use std::sync::Arc;

use reelsmith_api::ApiServer;
use reelsmith_config::{LogFormatSetting, PollSettings, ServiceConfig};
use reelsmith_core::{
    GenerationWorkflow, PollPolicy, TokioSleeper, UploadOptions, WorkflowDependencies,
    WorkflowSettings,
};
use reelsmith_providers::{CloudinaryPublisher, VertexClient, build_client, credential_provider};
use reelsmith_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the service.
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    config: ServiceConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the process environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        Self::from_config(config)
    }

    pub(crate) fn from_config(config: ServiceConfig) -> AppResult<Self> {
        let logging = LoggingConfig {
            format: log_format(config.log_format),
            ..LoggingConfig::default()
        };
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            logging,
            config,
            telemetry,
        })
    }
}

/// Entry point for the service boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, telemetry, provider construction or the
/// HTTP listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    reelsmith_telemetry::init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("reelsmith");

    let BootstrapDependencies {
        logging: _,
        config,
        telemetry,
    } = dependencies;
    info!(
        project = %config.vertex.project,
        location = %config.vertex.location,
        model = %config.vertex.model,
        cloud = %config.cloudinary.cloud_name,
        staging = %config.staging.dir.display(),
        "reelsmith bootstrap starting"
    );

    let workflow = build_workflow(&config, telemetry.clone())?;
    let api = ApiServer::new(Arc::new(workflow), telemetry);

    let addr = config.server.socket_addr();
    info!(addr = %addr, "launching API listener");
    api.serve(addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Build the generation workflow backed by the real provider adapters.
pub(crate) fn build_workflow(
    config: &ServiceConfig,
    telemetry: Metrics,
) -> AppResult<GenerationWorkflow> {
    let client = build_client(config.http_timeout)
        .map_err(|err| AppError::provider("http.build_client", err))?;
    let deps = WorkflowDependencies {
        credentials: credential_provider(&config.credentials),
        generator: Arc::new(VertexClient::new(client.clone(), &config.vertex)),
        publisher: Arc::new(CloudinaryPublisher::new(client, &config.cloudinary)),
        sleeper: Arc::new(TokioSleeper),
    };
    Ok(GenerationWorkflow::new(
        deps,
        workflow_settings(config),
        telemetry,
    ))
}

pub(crate) fn workflow_settings(config: &ServiceConfig) -> WorkflowSettings {
    WorkflowSettings {
        poll: poll_policy(&config.poll),
        staging_dir: config.staging.dir.clone(),
        upload: UploadOptions {
            resource_type: config.cloudinary.resource_type.clone(),
            folder: config.cloudinary.folder.clone(),
        },
    }
}

pub(crate) const fn poll_policy(settings: &PollSettings) -> PollPolicy {
    PollPolicy::new(settings.base_delay, settings.max_attempts)
}

const fn log_format(setting: Option<LogFormatSetting>) -> LogFormat {
    match setting {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_with(extra: &[(&str, &str)]) -> AppResult<ServiceConfig> {
        let env: HashMap<String, String> = [
            ("GCLOUD_PROJECT", "demo-project"),
            ("GCLOUD_LOCATION", "us-central1"),
            ("GCLOUD_MODEL", "veo-2.0-generate-001"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "1234"),
            ("CLOUDINARY_API_SECRET", "shh"),
        ]
        .iter()
        .chain(extra)
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
        let lookup = move |name: &str| env.get(name).cloned();
        ServiceConfig::from_lookup(&lookup).map_err(|err| AppError::config("test", err))
    }

    #[test]
    fn poll_settings_map_to_policy() -> AppResult<()> {
        let config = config_with(&[
            ("REELSMITH_POLL_BASE_DELAY_MS", "500"),
            ("REELSMITH_POLL_MAX_ATTEMPTS", "4"),
        ])?;
        let policy = poll_policy(&config.poll);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_attempts, 4);
        Ok(())
    }

    #[test]
    fn default_policy_matches_production_schedule() -> AppResult<()> {
        let policy = poll_policy(&config_with(&[])?.poll);
        assert_eq!(policy, PollPolicy::default());
        Ok(())
    }

    #[test]
    fn workflow_settings_follow_config() -> anyhow::Result<()> {
        let staging = tempfile::TempDir::new()?;
        let dir = staging.path().to_string_lossy().into_owned();
        let config = config_with(&[
            ("REELSMITH_STAGING_DIR", dir.as_str()),
            ("CLOUDINARY_FOLDER", "clips"),
        ])?;

        let settings = workflow_settings(&config);
        assert_eq!(settings.staging_dir, staging.path());
        assert_eq!(settings.upload.folder, "clips");
        assert_eq!(settings.upload.resource_type, "video");
        Ok(())
    }

    #[test]
    fn log_format_override_wins() {
        assert_eq!(log_format(Some(LogFormatSetting::Json)), LogFormat::Json);
        assert_eq!(log_format(Some(LogFormatSetting::Pretty)), LogFormat::Pretty);
        assert_eq!(log_format(None), LogFormat::infer());
    }

    #[tokio::test]
    async fn workflow_builds_from_config() -> AppResult<()> {
        let config = config_with(&[("GOOGLE_ACCESS_TOKEN", "ya29.static")])?;
        let dependencies = BootstrapDependencies::from_config(config)?;
        let workflow = build_workflow(&dependencies.config, dependencies.telemetry.clone())?;
        assert_eq!(workflow.metrics().snapshot().in_flight, 0);
        Ok(())
    }
}
