use std::env;
use std::fs;
use std::path::Path;

use clientele_core::config::{resolve_config_path, AppConfig, LoadOptions, LEGACY_DATABASE_URL_ENV};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let file_doc = config_file_doc.as_ref();
    let file_path = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &redact_url(&config.database.url),
        field_source(
            "database.url",
            &["CLIENTELE_DATABASE_URL", LEGACY_DATABASE_URL_ENV],
            file_doc,
            file_path,
        ),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source(
            "database.max_connections",
            &["CLIENTELE_DATABASE_MAX_CONNECTIONS"],
            file_doc,
            file_path,
        ),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source(
            "database.timeout_secs",
            &["CLIENTELE_DATABASE_TIMEOUT_SECS"],
            file_doc,
            file_path,
        ),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source(
            "server.bind_address",
            &["CLIENTELE_SERVER_BIND_ADDRESS"],
            file_doc,
            file_path,
        ),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source("server.port", &["CLIENTELE_SERVER_PORT"], file_doc, file_path),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        field_source(
            "server.graceful_shutdown_secs",
            &["CLIENTELE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            file_doc,
            file_path,
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            &["CLIENTELE_LOGGING_LEVEL", "CLIENTELE_LOG_LEVEL"],
            file_doc,
            file_path,
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            &["CLIENTELE_LOGGING_FORMAT", "CLIENTELE_LOG_FORMAT"],
            file_doc,
            file_path,
        ),
    ));

    lines.join("\n")
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

/// Masks `user:password@` in the URL authority and any query string,
/// which is where sqlx URLs carry credentials and keys.
pub fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let (base, query) = match trimmed.split_once('?') {
        Some((base, _)) => (base, "?<redacted>"),
        None => (trimmed, ""),
    };

    let redacted_base = match base.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => base.to_string(),
        },
        None => base.to_string(),
    };

    format!("{redacted_base}{query}")
}
