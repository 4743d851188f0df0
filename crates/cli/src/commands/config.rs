use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use smartcart_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let dataset = config
        .data
        .dataset_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<demo>".to_string());

    let fields: [(&str, String, &[&str]); 9] = [
        (
            "engine.min_support",
            config.engine.min_support.to_string(),
            &["SMARTCART_ENGINE_MIN_SUPPORT"],
        ),
        (
            "engine.habit_threshold",
            config.engine.habit_threshold.to_string(),
            &["SMARTCART_ENGINE_HABIT_THRESHOLD"],
        ),
        (
            "engine.top_n_trending",
            config.engine.top_n_trending.to_string(),
            &["SMARTCART_ENGINE_TOP_N_TRENDING"],
        ),
        (
            "engine.top_n_similarity",
            config.engine.top_n_similarity.to_string(),
            &["SMARTCART_ENGINE_TOP_N_SIMILARITY"],
        ),
        (
            "engine.similarity_axis",
            format!("{:?}", config.engine.similarity_axis),
            &["SMARTCART_ENGINE_SIMILARITY_AXIS"],
        ),
        (
            "engine.refresh_timeout_secs",
            config.engine.refresh_timeout_secs.to_string(),
            &["SMARTCART_ENGINE_REFRESH_TIMEOUT_SECS"],
        ),
        ("data.dataset_path", dataset, &["SMARTCART_DATA_DATASET_PATH"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["SMARTCART_LOGGING_LEVEL", "SMARTCART_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["SMARTCART_LOGGING_FORMAT", "SMARTCART_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|env_key| env::var_os(env_key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
