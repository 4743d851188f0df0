pub mod config;
pub mod pairs;
pub mod recommend;
pub mod similar;
pub mod trending;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use smartcart_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use smartcart_core::engine::{RefreshedIndices, SmartCartEngine};
use smartcart_core::errors::ApplicationError;
use tracing::{info, warn};

use crate::dataset;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, Value::Null)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{}: {error}", error.user_message()),
            error.exit_code(),
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// A loaded configuration plus an engine with one published snapshot.
pub(crate) struct Session {
    pub config: AppConfig,
    pub engine: SmartCartEngine,
    pub snapshot: Arc<RefreshedIndices>,
}

pub(crate) fn open_session(
    dataset_path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<Session, ApplicationError> {
    let config = AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { dataset_path, ..overrides },
        ..LoadOptions::default()
    })
    .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

    let store = match &config.data.dataset_path {
        Some(path) => dataset::load(path)
            .map_err(|error| ApplicationError::Dataset(format!("{error:#}")))?,
        None => {
            info!(event_name = "cli.dataset.demo", "no dataset configured; using demo data");
            dataset::demo()
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ApplicationError::Configuration(format!("async runtime: {error}")))?;

    let engine = SmartCartEngine::with_config(config.engine.recommendation_config());
    let deadline = config.engine.refresh_timeout();
    let snapshot = runtime.block_on(engine.refresh_from_store(store, Some(deadline))).map_err(
        |error| {
            warn!(
                event_name = "cli.refresh.failed",
                error = %error,
                "refresh failed; no snapshot to serve"
            );
            ApplicationError::from(error)
        },
    )?;

    Ok(Session { config, engine, snapshot })
}

/// Splits `A,B , C` into trimmed, non-empty ids.
pub(crate) fn split_ids(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}
