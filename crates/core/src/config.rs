use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::RecommendationConfig;
use crate::signals::{SimilarityAxis, DEFAULT_HABIT_THRESHOLD, DEFAULT_MIN_SUPPORT, DEFAULT_TOP_N};

pub const DEFAULT_CONFIG_FILE: &str = "smartcart.toml";
pub const NESTED_CONFIG_FILE: &str = "config/smartcart.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub min_support: u32,
    pub habit_threshold: u32,
    pub top_n_trending: usize,
    pub top_n_similarity: usize,
    pub similarity_axis: SimilarityAxis,
    pub refresh_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataConfig {
    pub dataset_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub min_support: Option<u32>,
    pub habit_threshold: Option<u32>,
    pub top_n_trending: Option<usize>,
    pub top_n_similarity: Option<usize>,
    pub similarity_axis: Option<SimilarityAxis>,
    pub dataset_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                min_support: DEFAULT_MIN_SUPPORT,
                habit_threshold: DEFAULT_HABIT_THRESHOLD,
                top_n_trending: DEFAULT_TOP_N,
                top_n_similarity: DEFAULT_TOP_N,
                similarity_axis: SimilarityAxis::Transaction,
                refresh_timeout_secs: 30,
            },
            data: DataConfig { dataset_path: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn recommendation_config(&self) -> RecommendationConfig {
        RecommendationConfig {
            min_support: self.min_support,
            habit_threshold: self.habit_threshold,
            top_n_trending: self.top_n_trending,
            top_n_similarity: self.top_n_similarity,
            similarity_axis: self.similarity_axis,
        }
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(min_support) = engine.min_support {
                self.engine.min_support = min_support;
            }
            if let Some(habit_threshold) = engine.habit_threshold {
                self.engine.habit_threshold = habit_threshold;
            }
            if let Some(top_n_trending) = engine.top_n_trending {
                self.engine.top_n_trending = top_n_trending;
            }
            if let Some(top_n_similarity) = engine.top_n_similarity {
                self.engine.top_n_similarity = top_n_similarity;
            }
            if let Some(similarity_axis) = engine.similarity_axis {
                self.engine.similarity_axis = similarity_axis;
            }
            if let Some(refresh_timeout_secs) = engine.refresh_timeout_secs {
                self.engine.refresh_timeout_secs = refresh_timeout_secs;
            }
        }

        if let Some(data) = patch.data {
            if let Some(dataset_path) = data.dataset_path {
                self.data.dataset_path = Some(dataset_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SMARTCART_ENGINE_MIN_SUPPORT") {
            self.engine.min_support = parse_u32("SMARTCART_ENGINE_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_ENGINE_HABIT_THRESHOLD") {
            self.engine.habit_threshold = parse_u32("SMARTCART_ENGINE_HABIT_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_ENGINE_TOP_N_TRENDING") {
            self.engine.top_n_trending = parse_usize("SMARTCART_ENGINE_TOP_N_TRENDING", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_ENGINE_TOP_N_SIMILARITY") {
            self.engine.top_n_similarity =
                parse_usize("SMARTCART_ENGINE_TOP_N_SIMILARITY", &value)?;
        }
        if let Some(value) = read_env("SMARTCART_ENGINE_SIMILARITY_AXIS") {
            self.engine.similarity_axis =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "SMARTCART_ENGINE_SIMILARITY_AXIS".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("SMARTCART_ENGINE_REFRESH_TIMEOUT_SECS") {
            self.engine.refresh_timeout_secs =
                parse_u64("SMARTCART_ENGINE_REFRESH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SMARTCART_DATA_DATASET_PATH") {
            self.data.dataset_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("SMARTCART_LOGGING_LEVEL").or_else(|| read_env("SMARTCART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SMARTCART_LOGGING_FORMAT").or_else(|| read_env("SMARTCART_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_support) = overrides.min_support {
            self.engine.min_support = min_support;
        }
        if let Some(habit_threshold) = overrides.habit_threshold {
            self.engine.habit_threshold = habit_threshold;
        }
        if let Some(top_n_trending) = overrides.top_n_trending {
            self.engine.top_n_trending = top_n_trending;
        }
        if let Some(top_n_similarity) = overrides.top_n_similarity {
            self.engine.top_n_similarity = top_n_similarity;
        }
        if let Some(similarity_axis) = overrides.similarity_axis {
            self.engine.similarity_axis = similarity_axis;
        }
        if let Some(dataset_path) = overrides.dataset_path {
            self.data.dataset_path = Some(dataset_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_data(&self.data)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.min_support == 0 {
        return Err(ConfigError::Validation(
            "engine.min_support must be greater than zero".to_string(),
        ));
    }

    if engine.habit_threshold == 0 {
        return Err(ConfigError::Validation(
            "engine.habit_threshold must be greater than zero".to_string(),
        ));
    }

    if engine.refresh_timeout_secs == 0 || engine.refresh_timeout_secs > 3600 {
        return Err(ConfigError::Validation(
            "engine.refresh_timeout_secs must be in range 1..=3600".to_string(),
        ));
    }

    Ok(())
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if let Some(path) = &data.dataset_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "data.dataset_path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    min_support: Option<u32>,
    habit_threshold: Option<u32>,
    top_n_trending: Option<usize>,
    top_n_similarity: Option<usize>,
    similarity_axis: Option<SimilarityAxis>,
    refresh_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    dataset_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::signals::SimilarityAxis;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_match_documented_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.engine.min_support == 2, "default min_support should be 2")?;
        ensure(config.engine.habit_threshold == 2, "default habit_threshold should be 2")?;
        ensure(config.engine.top_n_trending == 5, "default top_n_trending should be 5")?;
        ensure(config.engine.top_n_similarity == 5, "default top_n_similarity should be 5")?;
        ensure(
            config.engine.similarity_axis == SimilarityAxis::Transaction,
            "transaction ids should be the default similarity axis",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SMARTCART_DATASET", "/srv/data/sales.json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("smartcart.toml");
            fs::write(
                &path,
                r#"
[engine]
min_support = 10
similarity_axis = "date"

[data]
dataset_path = "${TEST_SMARTCART_DATASET}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.min_support == 10, "min_support should come from file")?;
            ensure(
                config.engine.similarity_axis == SimilarityAxis::Date,
                "similarity axis should come from file",
            )?;
            ensure(
                config.data.dataset_path == Some(PathBuf::from("/srv/data/sales.json")),
                "dataset path should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SMARTCART_DATASET"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_LOG_LEVEL", "warn");
        env::set_var("SMARTCART_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SMARTCART_LOG_LEVEL", "SMARTCART_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_ENGINE_MIN_SUPPORT", "4");
        env::set_var("SMARTCART_ENGINE_TOP_N_TRENDING", "8");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("smartcart.toml");
            fs::write(
                &path,
                r#"
[engine]
min_support = 3
top_n_trending = 7
top_n_similarity = 9

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    min_support: Some(6),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.min_support == 6, "override min_support should win")?;
            ensure(config.engine.top_n_trending == 8, "env top_n_trending should beat file")?;
            ensure(config.engine.top_n_similarity == 9, "file value should beat default")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["SMARTCART_ENGINE_MIN_SUPPORT", "SMARTCART_ENGINE_TOP_N_TRENDING"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_ENGINE_MIN_SUPPORT", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("engine.min_support")
            );
            ensure(has_message, "validation failure should mention engine.min_support")
        })();

        clear_vars(&["SMARTCART_ENGINE_MIN_SUPPORT"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SMARTCART_ENGINE_SIMILARITY_AXIS", "weekly");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected invalid env override".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "SMARTCART_ENGINE_SIMILARITY_AXIS"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["SMARTCART_ENGINE_SIMILARITY_AXIS"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(error, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
