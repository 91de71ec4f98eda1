//! Exporter configuration.
//!
//! Settings come from a YAML file, with environment variables prefixed by
//! `STATUSWATCH__` layered on top (`STATUSWATCH__SERVER__LISTEN=:9100`).

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use statuswatch_adapters::config::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use statuswatch_adapters::{SourceDefaults, TargetConfig};
use statuswatch_sdk::prometheus::{is_valid_namespace, PrometheusConfig};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "STATUSWATCH";

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub common: CommonSettings,
    /// Status pages to watch, in exposition order.
    pub pages: Vec<TargetConfig>,
}

/// The metrics listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind, `host:port` or `:port`.
    pub listen: String,
    pub metrics_path: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

/// Settings shared by every page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommonSettings {
    #[serde(deserialize_with = "statuswatch_adapters::duration::deserialize_option")]
    pub interval: Option<Duration>,
    #[serde(deserialize_with = "statuswatch_adapters::duration::deserialize_option")]
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// One of debug, info, warn or error.
    pub log_level: String,
    /// Report Unknown components as up.
    pub unknown_is_up: bool,
    /// Optional prefix for every metric name.
    pub namespace: Option<String>,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            interval: None,
            timeout: None,
            user_agent: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            unknown_is_up: false,
            namespace: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` and the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: &Path, env: Environment) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        let mut settings: Settings = config
            .try_deserialize()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        settings.normalize();
        settings
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(ns) = self.common.namespace.as_deref().map(str::trim) {
            ensure!(
                ns.is_empty() || is_valid_namespace(ns),
                "namespace {:?} is not a valid metric name prefix, expected [a-zA-Z_:][a-zA-Z0-9_:]*",
                ns
            );
        }
        Ok(())
    }

    /// Apply command line overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, listen: Option<&str>, log_level: Option<&str>) {
        if let Some(listen) = listen.filter(|l| !l.trim().is_empty()) {
            self.server.listen = listen.to_string();
        }
        if let Some(level) = log_level.filter(|l| !l.trim().is_empty()) {
            self.common.log_level = level.to_string();
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let listen = self.server.listen.trim();
        self.server.listen = if listen.is_empty() {
            DEFAULT_LISTEN.to_string()
        } else if listen.starts_with(':') {
            format!("0.0.0.0{}", listen)
        } else {
            listen.to_string()
        };

        let path = self.server.metrics_path.trim();
        self.server.metrics_path = if path.is_empty() {
            DEFAULT_METRICS_PATH.to_string()
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        if self.common.log_level.trim().is_empty() {
            self.common.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
    }

    /// Defaults for pages without their own interval or timeout.
    pub fn source_defaults(&self) -> SourceDefaults {
        let pick = |value: Option<Duration>, fallback: Duration| {
            value.filter(|d| !d.is_zero()).unwrap_or(fallback)
        };

        SourceDefaults {
            interval: pick(self.common.interval, DEFAULT_INTERVAL),
            timeout: pick(self.common.timeout, DEFAULT_TIMEOUT),
            user_agent: self
                .common
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Listener settings for the metrics endpoint.
    pub fn prometheus_config(&self) -> PrometheusConfig {
        let builder = PrometheusConfig::builder()
            .listen_addr(&self.server.listen)
            .metrics_path(&self.server.metrics_path);

        match &self.common.namespace {
            Some(ns) => builder.namespace(ns.trim()).build(),
            None => builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use config::Map;
    use tempfile::NamedTempFile;

    use super::*;

    const FULL: &str = r#"
server:
  listen: ":9100"
  metrics_path: status
common:
  interval: 1m30s
  timeout: 5s
  user_agent: acme-monitor/2.0
  log_level: debug
  unknown_is_up: true
  namespace: acme
pages:
  - name: github
    type: statuspage
    url: https://www.githubstatus.com
    user_friendly_url: https://githubstatus.com
    interval: 2m
  - name: uptime
    type: betterstack
    page_id: "12345"
    api_token: secret
  - name: aws
    type: aws_rss
    feeds:
      - url: https://status.aws.amazon.com/rss/ec2-us-east-1.rss
        service: ec2
        region: us-east-1
"#;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Environment {
        env_from(&[])
    }

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(FULL);
        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();

        assert_eq!(settings.server.listen, "0.0.0.0:9100");
        assert_eq!(settings.server.metrics_path, "/status");
        assert_eq!(settings.common.interval, Some(Duration::from_secs(90)));
        assert_eq!(settings.common.timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.common.log_level, "debug");
        assert!(settings.common.unknown_is_up);

        assert_eq!(settings.pages.len(), 3);
        assert_eq!(settings.pages[0].kind, "statuspage");
        assert_eq!(settings.pages[0].interval, Some(Duration::from_secs(120)));
        assert_eq!(settings.pages[0].display_url(), "https://githubstatus.com");
        assert_eq!(settings.pages[1].page_id.as_deref(), Some("12345"));
        assert_eq!(settings.pages[2].feeds[0].region, "us-east-1");

        let defaults = settings.source_defaults();
        assert_eq!(defaults.interval, Duration::from_secs(90));
        assert_eq!(defaults.user_agent, "acme-monitor/2.0");

        let prometheus = settings.prometheus_config();
        assert_eq!(prometheus.listen_addr, "0.0.0.0:9100");
        assert_eq!(prometheus.namespace.as_deref(), Some("acme"));
    }

    #[test]
    fn test_defaults_for_minimal_config() {
        let file = write_config("pages: []\n");
        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();

        assert_eq!(settings.server.listen, DEFAULT_LISTEN);
        assert_eq!(settings.server.metrics_path, "/metrics");
        assert_eq!(settings.common.log_level, "info");
        assert!(!settings.common.unknown_is_up);
        assert!(settings.pages.is_empty());

        let defaults = settings.source_defaults();
        assert_eq!(defaults, SourceDefaults::default());
        assert_eq!(settings.prometheus_config().namespace, None);
    }

    #[test]
    fn test_zero_durations_fall_back() {
        let file = write_config("common:\n  interval: 0s\n  timeout: 0\n");
        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();

        let defaults = settings.source_defaults();
        assert_eq!(defaults.interval, DEFAULT_INTERVAL);
        assert_eq!(defaults.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(FULL);
        let env = env_from(&[
            ("STATUSWATCH__SERVER__LISTEN", "127.0.0.1:9999"),
            ("STATUSWATCH__COMMON__LOG_LEVEL", "warn"),
        ]);
        let settings = Settings::load_with_env(file.path(), env).unwrap();

        assert_eq!(settings.server.listen, "127.0.0.1:9999");
        assert_eq!(settings.common.log_level, "warn");
        assert_eq!(settings.pages.len(), 3);
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some(":7000"), Some("error"));
        assert_eq!(settings.server.listen, "0.0.0.0:7000");
        assert_eq!(settings.common.log_level, "error");

        settings.apply_overrides(Some(""), None);
        assert_eq!(settings.server.listen, "0.0.0.0:7000");
        assert_eq!(settings.common.log_level, "error");
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let file = write_config("common:\n  interval: soon\n");
        let err = Settings::load_with_env(file.path(), no_env()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid config"));
    }

    #[test]
    fn test_invalid_namespace_is_rejected() {
        let file = write_config("common:\n  namespace: my-app\n");
        let err = Settings::load_with_env(file.path(), no_env()).unwrap_err();
        assert!(format!("{:#}", err).contains("my-app"));

        let file = write_config("common:\n  namespace: my_app\n");
        let settings = Settings::load_with_env(file.path(), no_env()).unwrap();
        assert_eq!(settings.prometheus_config().namespace.as_deref(), Some("my_app"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Settings::load(Path::new("/nonexistent/statuswatch.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
