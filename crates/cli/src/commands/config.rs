use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hakata_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use toml::Value;

struct ConfigField<'a> {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: &'a str,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let max_connections = config.database.max_connections.to_string();
    let timeout_secs = config.database.timeout_secs.to_string();
    let max_write_retries = config.store.max_write_retries.to_string();
    let allow_unarchive = config.lifecycle.allow_unarchive.to_string();
    let log_format = format!("{:?}", config.logging.format).to_ascii_lowercase();

    let fields = [
        ConfigField {
            key_path: "database.url",
            env_keys: &["HAKATA_DATABASE_URL"],
            value: &config.database.url,
        },
        ConfigField {
            key_path: "database.max_connections",
            env_keys: &["HAKATA_DATABASE_MAX_CONNECTIONS"],
            value: &max_connections,
        },
        ConfigField {
            key_path: "database.timeout_secs",
            env_keys: &["HAKATA_DATABASE_TIMEOUT_SECS"],
            value: &timeout_secs,
        },
        ConfigField {
            key_path: "store.max_write_retries",
            env_keys: &["HAKATA_STORE_MAX_WRITE_RETRIES"],
            value: &max_write_retries,
        },
        ConfigField {
            key_path: "lifecycle.allow_unarchive",
            env_keys: &["HAKATA_LIFECYCLE_ALLOW_UNARCHIVE"],
            value: &allow_unarchive,
        },
        ConfigField {
            key_path: "logging.level",
            env_keys: &["HAKATA_LOGGING_LEVEL", "HAKATA_LOG_LEVEL"],
            value: &config.logging.level,
        },
        ConfigField {
            key_path: "logging.format",
            env_keys: &["HAKATA_LOGGING_FORMAT", "HAKATA_LOG_FORMAT"],
            value: &log_format,
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        lines.push(render_line(
            field.key_path,
            field.value,
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
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
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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
