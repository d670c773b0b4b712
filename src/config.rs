//! Runtime configuration for lingo-gateway.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! Command-line flags override values from the file.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lingo-gateway",
    about = "Prompt completion and translation gateway for a local Ollama model"
)]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Model name (overrides the config file).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the Ollama service (overrides the config file).
    #[arg(long, env = "OLLAMA_HOST")]
    pub ollama_host: Option<String>,

    /// Stream a fixed question to stdout before serving.
    #[arg(long)]
    pub stream_check: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Model configuration.
    pub model: ModelConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Model service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier as known to the inference service.
    pub name: String,

    /// Base URL of the Ollama HTTP API.
    pub base_url: String,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Sampling temperature forwarded to the model (service default when unset).
    pub temperature: Option<f64>,

    /// Context window size forwarded to the model (service default when unset).
    pub num_ctx: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "qwen".to_string(),
            base_url: "http://127.0.0.1:11434".to_string(),
            connect_timeout_secs: 10,
            temperature: None,
            num_ctx: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(model) = &cli.model {
            self.model.name = model.clone();
        }
        if let Some(host) = &cli.ollama_host {
            self.model.base_url = normalize_host(host);
        }
        self
    }
}

/// `OLLAMA_HOST` is commonly given without a scheme (`127.0.0.1:11434`).
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["lingo-gateway"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
        assert_eq!(cfg.model.name, "qwen");
        assert_eq!(cfg.model.base_url, "http://127.0.0.1:11434");
        assert!(cfg.model.temperature.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load(std::path::Path::new("/nonexistent/lingo.json")).unwrap();
        assert_eq!(cfg.model.name, "qwen");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"model": {{"name": "llama3", "temperature": 0.2}}}}"#).unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.model.name, "llama3");
        assert_eq!(cfg.model.temperature, Some(0.2));
        assert_eq!(cfg.model.base_url, "http://127.0.0.1:11434");
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cfg = Config::default().apply_cli(&cli(&[
            "--listen",
            "127.0.0.1:9000",
            "--model",
            "mistral",
            "--ollama-host",
            "10.0.0.2:11434",
        ]));
        assert_eq!(cfg.server.listen, "127.0.0.1:9000");
        assert_eq!(cfg.model.name, "mistral");
        assert_eq!(cfg.model.base_url, "http://10.0.0.2:11434");
    }

    #[test]
    fn test_host_with_scheme_kept() {
        assert_eq!(normalize_host("https://ollama.local"), "https://ollama.local");
    }
}
