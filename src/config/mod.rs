//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::{Args, Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brezza";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CMS_URL: &str = "http://localhost:1337";
const DEFAULT_CACHE_CAPACITY: usize = 256;
const DEFAULT_SLUG_SCAN_LIMIT: u32 = 100;

/// Command-line arguments for the Brezza binary.
#[derive(Debug, Parser)]
#[command(name = "brezza", version, about = "Brezza content presentation server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BREZZA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the CMS base URL.
    #[arg(long = "cms-base-url", value_name = "URL")]
    pub cms_base_url: Option<String>,

    /// Override the tag-cache capacity (entries).
    #[arg(long = "cms-cache-capacity", value_name = "COUNT")]
    pub cms_cache_capacity: Option<usize>,

    /// Override the slug-lookup scan bound.
    #[arg(long = "cms-slug-scan-limit", value_name = "COUNT")]
    pub cms_slug_scan_limit: Option<u32>,

    /// Override the shared revalidation secret.
    #[arg(long = "revalidate-secret", value_name = "SECRET", hide_env_values = true, env = "BREZZA_REVALIDATE_SECRET")]
    pub revalidate_secret: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub revalidate: RevalidateSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub base_url: Url,
    pub cache_capacity: NonZeroUsize,
    pub slug_scan_limit: u32,
}

#[derive(Debug, Clone)]
pub struct RevalidateSettings {
    /// Shared secret the webhook must present. When unset, every
    /// revalidation request is rejected.
    pub secret: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BREZZA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    revalidate: RawRevalidateSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    base_url: Option<String>,
    cache_capacity: Option<usize>,
    slug_scan_limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidateSettings {
    secret: Option<String>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.cms_base_url.as_ref() {
            self.cms.base_url = Some(url.clone());
        }
        if let Some(capacity) = overrides.cms_cache_capacity {
            self.cms.cache_capacity = Some(capacity);
        }
        if let Some(limit) = overrides.cms_slug_scan_limit {
            self.cms.slug_scan_limit = Some(limit);
        }
        if let Some(secret) = overrides.revalidate_secret.as_ref() {
            self.revalidate.secret = Some(secret.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            revalidate,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            revalidate: build_revalidate_settings(revalidate),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .map_err(|err| LoadError::invalid("server.addr", err.to_string()))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let base = cms
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CMS_URL.to_string());
    let base_url = Url::parse(&base)
        .map_err(|err| LoadError::invalid("cms.base_url", err.to_string()))?;

    let capacity = cms.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
    let cache_capacity = NonZeroUsize::new(capacity)
        .ok_or_else(|| LoadError::invalid("cms.cache_capacity", "must be greater than zero"))?;

    let slug_scan_limit = cms.slug_scan_limit.unwrap_or(DEFAULT_SLUG_SCAN_LIMIT);
    if slug_scan_limit == 0 {
        return Err(LoadError::invalid(
            "cms.slug_scan_limit",
            "must be greater than zero",
        ));
    }

    Ok(CmsSettings {
        base_url,
        cache_capacity,
        slug_scan_limit,
    })
}

fn build_revalidate_settings(revalidate: RawRevalidateSettings) -> RevalidateSettings {
    let secret = revalidate
        .secret
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    RevalidateSettings { secret }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_any_input() {
        let settings = Settings::from_raw(RawSettings::default()).expect("defaults");
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.cms.base_url.as_str(), "http://localhost:1337/");
        assert_eq!(settings.cms.slug_scan_limit, DEFAULT_SLUG_SCAN_LIMIT);
        assert!(settings.revalidate.secret.is_none());
    }

    #[test]
    fn overrides_take_precedence() {
        let mut raw = RawSettings::default();
        raw.apply_overrides(&Overrides {
            server_port: Some(8080),
            cms_base_url: Some("http://cms.internal:1337".to_string()),
            revalidate_secret: Some("s3cret".to_string()),
            ..Default::default()
        });

        let settings = Settings::from_raw(raw).expect("settings");
        assert_eq!(settings.server.addr.port(), 8080);
        assert_eq!(settings.cms.base_url.host_str(), Some("cms.internal"));
        assert_eq!(settings.revalidate.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn zero_port_rejected() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero port");
        assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
    }

    #[test]
    fn invalid_cms_url_rejected() {
        let mut raw = RawSettings::default();
        raw.cms.base_url = Some("not a url".to_string());
        let err = Settings::from_raw(raw).expect_err("bad url");
        assert!(matches!(err, LoadError::Invalid { key: "cms.base_url", .. }));
    }

    #[test]
    fn blank_secret_treated_as_missing() {
        let mut raw = RawSettings::default();
        raw.revalidate.secret = Some("   ".to_string());
        let settings = Settings::from_raw(raw).expect("settings");
        assert!(settings.revalidate.secret.is_none());
    }
}
