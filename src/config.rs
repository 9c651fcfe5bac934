use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::i18n::Locale;

const DEFAULTS: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub locale: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Delay between a successful upload and the modal closing, so the user
    /// sees the bar at 100%.
    pub close_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ui: UiConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Resolved locale. `validate` guarantees the string parses.
    pub fn locale(&self) -> Locale {
        self.ui.locale.parse().unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

/// Loads embedded defaults -> netfs.toml -> $NETFS_CONFIG -> NETFS__* env.
pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let custom = std::env::var("NETFS_CONFIG").ok();
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: netfs.toml (in CWD)
        .add_source(::config::File::with_name("netfs").required(false));

    if let Some(custom_path) = custom.as_deref() {
        builder = builder.add_source(::config::File::with_name(custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("NETFS").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

/// Embedded defaults overlaid with a single TOML file, without touching the
/// environment.
pub fn load_from_file(path: &Path) -> anyhow::Result<AppConfig> {
    let cfg = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
        .build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    let url = reqwest::Url::parse(&cfg.server.base_url)
        .map_err(|e| anyhow::anyhow!("invalid server.base_url '{}': {}", cfg.server.base_url, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!("server.base_url must use http or https, got '{}'", url.scheme()));
    }
    if cfg.server.request_timeout_secs == 0 {
        return Err(anyhow::anyhow!("server.request_timeout_secs must be > 0"));
    }
    if cfg.server.connect_timeout_secs == 0 {
        return Err(anyhow::anyhow!("server.connect_timeout_secs must be > 0"));
    }

    // UI
    if cfg.ui.locale.parse::<Locale>().is_err() {
        return Err(anyhow::anyhow!("unsupported ui.locale '{}' (expected en or ja)", cfg.ui.locale));
    }

    // Upload
    if cfg.upload.close_delay_ms > 10_000 {
        tracing::warn!("upload.close_delay_ms={} keeps the upload dialog open for a long time", cfg.upload.close_delay_ms);
    }

    // Logging
    if cfg.logging.file_name.trim().is_empty() {
        return Err(anyhow::anyhow!("logging.file_name must not be empty"));
    }

    Ok(())
}
