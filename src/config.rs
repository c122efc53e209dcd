//! TOML configuration.
//!
//! ```toml
//! [data]
//! path = "data/kjv.json"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! static_dir = "public"
//!
//! [cache]
//! ttl_secs = 86400
//!
//! [completion]
//! provider = "openai"
//! translate_model = "gpt-3.5-turbo"
//! commentary_model = "gpt-4o-mini"
//! ```
//!
//! Only `[data]` is required; every other section has defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Path to the verse document (`{ "books": [...] }`).
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory of browser UI assets served for non-API paths.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    86_400
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_translate_model")]
    pub translate_model: String,
    #[serde(default = "default_commentary_model")]
    pub commentary_model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            translate_model: default_translate_model(),
            commentary_model: default_commentary_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_translate_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_commentary_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Resolves the listen address, letting the `PORT` environment
    /// variable override the configured port.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let port = std::env::var("PORT").ok();
        resolve_bind(&self.server.bind, port.as_deref())
    }
}

fn resolve_bind(bind: &str, port_override: Option<&str>) -> Result<SocketAddr> {
    let mut addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("server.bind is not a socket address: {}", bind))?;

    if let Some(port) = port_override.filter(|p| !p.trim().is_empty()) {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("PORT is not a valid port: {}", port))?;
        addr.set_port(port);
    }

    Ok(addr)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative data and asset paths are resolved against the config file.
    if let Some(base) = path.parent() {
        if config.data.path.is_relative() {
            config.data.path = base.join(&config.data.path);
        }
        if let Some(dir) = config.server.static_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.cache.ttl_secs == 0 {
        anyhow::bail!("cache.ttl_secs must be > 0");
    }

    config
        .server
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("server.bind is not a socket address: {}", config.server.bind))?;

    match config.completion.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.completion.is_enabled() {
        if config.completion.translate_model.trim().is_empty() {
            anyhow::bail!("completion.translate_model must not be empty");
        }
        if config.completion.commentary_model.trim().is_empty() {
            anyhow::bail!("completion.commentary_model must not be empty");
        }
        if config.completion.timeout_secs == 0 {
            anyhow::bail!("completion.timeout_secs must be > 0");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("preach.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[data]\npath = \"data/kjv.json\"\n");
        let config = load_config(&path).unwrap();

        assert_eq!(config.data.path, tmp.path().join("data/kjv.json"));
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.cache.ttl_secs, 86_400);
        assert_eq!(config.completion.provider, "openai");
        assert_eq!(config.completion.translate_model, "gpt-3.5-turbo");
        assert_eq!(config.completion.commentary_model, "gpt-4o-mini");
    }

    #[test]
    fn test_absolute_paths_kept() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "[data]\npath = \"/srv/kjv.json\"\n[server]\nbind = \"0.0.0.0:8080\"\nstatic_dir = \"public\"\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.data.path, PathBuf::from("/srv/kjv.json"));
        assert_eq!(config.server.static_dir, Some(tmp.path().join("public")));
    }

    #[test]
    fn test_missing_data_section_fails() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[server]\nbind = \"127.0.0.1:3000\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_invalid_values_fail() {
        let tmp = TempDir::new().unwrap();

        let path = write_config(&tmp, "[data]\npath = \"k.json\"\n[cache]\nttl_secs = 0\n");
        assert!(load_config(&path).is_err());

        let path = write_config(
            &tmp,
            "[data]\npath = \"k.json\"\n[completion]\nprovider = \"cohere\"\n",
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown completion provider"));

        let path = write_config(&tmp, "[data]\npath = \"k.json\"\n[server]\nbind = \"nowhere\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_port_override() {
        let addr = resolve_bind("127.0.0.1:3000", Some("8081")).unwrap();
        assert_eq!(addr.port(), 8081);
        let addr = resolve_bind("127.0.0.1:3000", None).unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(resolve_bind("127.0.0.1:3000", Some("http")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/preach.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
