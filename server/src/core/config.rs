use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_EXPORT_INTERVAL_MS, DEFAULT_EXPORTER_ENDPOINT,
    DEFAULT_EXPORTER_TIMEOUT_SECS, DEFAULT_KAFKA_BROKERS, DEFAULT_KAFKA_GROUP_ID,
    DEFAULT_KAFKA_SESSION_TIMEOUT_MS, DEFAULT_KAFKA_TOPIC, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_VERSION,
};

// =============================================================================
// Bus Backend Enum
// =============================================================================

/// Message bus the records are consumed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusBackendType {
    #[default]
    Kafka,
    /// Newline-delimited JSON on standard input
    Stdin,
}

impl fmt::Display for BusBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusBackendType::Kafka => write!(f, "kafka"),
            BusBackendType::Stdin => write!(f, "stdin"),
        }
    }
}

// =============================================================================
// Offset Reset Enum
// =============================================================================

/// Where a consumer group without committed offsets starts reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    #[default]
    Earliest,
    Latest,
}

impl OffsetReset {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

impl fmt::Display for OffsetReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Value Selection Enum
// =============================================================================

/// How a gauge data point's numeric value is chosen from `as_double`/`as_int`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSelection {
    /// `as_double` if non-zero, else `as_int` if non-zero, else 0.
    /// A legitimate zero falls through to the next field.
    #[default]
    NonZero,
    /// `as_double` if present, else `as_int` if present, else 0
    Presence,
}

impl fmt::Display for ValueSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSelection::NonZero => write!(f, "nonzero"),
            ValueSelection::Presence => write!(f, "presence"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Message bus configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BusFileConfig {
    pub backend: Option<BusBackendType>,
    pub brokers: Option<String>,
    pub topic: Option<String>,
    pub group_id: Option<String>,
    pub auto_offset_reset: Option<OffsetReset>,
    pub session_timeout_ms: Option<u64>,
}

/// Exporter configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExporterFileConfig {
    pub endpoint: Option<String>,
    pub insecure: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub interval_ms: Option<u64>,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
}

/// Extraction configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExtractFileConfig {
    pub value_selection: Option<ValueSelection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub bus: Option<BusFileConfig>,
    pub exporter: Option<ExporterFileConfig>,
    pub extract: Option<ExtractFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra {
            if map.is_empty() {
                return;
            }
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(bus) = other.bus {
            let current = self.bus.get_or_insert_with(BusFileConfig::default);
            if bus.backend.is_some() {
                tracing::trace!(backend = ?bus.backend, "Merging bus.backend");
                current.backend = bus.backend;
            }
            if bus.brokers.is_some() {
                tracing::trace!(brokers = ?bus.brokers, "Merging bus.brokers");
                current.brokers = bus.brokers;
            }
            if bus.topic.is_some() {
                tracing::trace!(topic = ?bus.topic, "Merging bus.topic");
                current.topic = bus.topic;
            }
            if bus.group_id.is_some() {
                tracing::trace!(group_id = ?bus.group_id, "Merging bus.group_id");
                current.group_id = bus.group_id;
            }
            if bus.auto_offset_reset.is_some() {
                current.auto_offset_reset = bus.auto_offset_reset;
            }
            if bus.session_timeout_ms.is_some() {
                current.session_timeout_ms = bus.session_timeout_ms;
            }
        }

        if let Some(exporter) = other.exporter {
            let current = self.exporter.get_or_insert_with(ExporterFileConfig::default);
            if exporter.endpoint.is_some() {
                tracing::trace!(endpoint = ?exporter.endpoint, "Merging exporter.endpoint");
                current.endpoint = exporter.endpoint;
            }
            if exporter.insecure.is_some() {
                current.insecure = exporter.insecure;
            }
            if exporter.timeout_secs.is_some() {
                current.timeout_secs = exporter.timeout_secs;
            }
            if exporter.interval_ms.is_some() {
                tracing::trace!(interval_ms = ?exporter.interval_ms, "Merging exporter.interval_ms");
                current.interval_ms = exporter.interval_ms;
            }
            if exporter.service_name.is_some() {
                current.service_name = exporter.service_name;
            }
            if exporter.service_version.is_some() {
                current.service_version = exporter.service_version;
            }
        }

        if let Some(extract) = other.extract {
            let current = self.extract.get_or_insert_with(ExtractFileConfig::default);
            if extract.value_selection.is_some() {
                tracing::trace!(
                    value_selection = ?extract.value_selection,
                    "Merging extract.value_selection"
                );
                current.value_selection = extract.value_selection;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Message bus configuration
#[derive(Debug, Clone, Serialize)]
pub struct BusConfig {
    pub backend: BusBackendType,
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub auto_offset_reset: OffsetReset,
    pub session_timeout_ms: u64,
}

/// OTLP exporter configuration
#[derive(Debug, Clone, Serialize)]
pub struct ExporterConfig {
    pub endpoint: String,
    /// Plaintext transport (`http://` endpoint)
    pub insecure: bool,
    pub timeout_secs: u64,
    pub interval_ms: u64,
    pub service_name: String,
    pub service_version: String,
}

/// Record extraction configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractConfig {
    pub value_selection: ValueSelection,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub bus: BusConfig,
    pub exporter: ExporterConfig,
    pub extract: ExtractConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.metricbridge/metricbridge.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = get_profile_config_path().filter(|p| p.exists()) {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer defaults -> file config -> CLI/env overrides, then validate
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_bus = file_config.bus.unwrap_or_default();
        let file_exporter = file_config.exporter.unwrap_or_default();
        let file_extract = file_config.extract.unwrap_or_default();

        let bus = BusConfig {
            backend: cli.bus.or(file_bus.backend).unwrap_or_default(),
            brokers: cli
                .brokers
                .clone()
                .or(file_bus.brokers)
                .unwrap_or_else(|| DEFAULT_KAFKA_BROKERS.to_string()),
            topic: cli
                .topic
                .clone()
                .or(file_bus.topic)
                .unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            group_id: cli
                .group_id
                .clone()
                .or(file_bus.group_id)
                .unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_string()),
            auto_offset_reset: cli
                .auto_offset_reset
                .or(file_bus.auto_offset_reset)
                .unwrap_or_default(),
            session_timeout_ms: file_bus
                .session_timeout_ms
                .unwrap_or(DEFAULT_KAFKA_SESSION_TIMEOUT_MS),
        };

        let exporter = ExporterConfig {
            endpoint: cli
                .exporter_endpoint
                .clone()
                .or(file_exporter.endpoint)
                .unwrap_or_else(|| DEFAULT_EXPORTER_ENDPOINT.to_string()),
            insecure: cli
                .exporter_insecure
                .or(file_exporter.insecure)
                .unwrap_or(true),
            timeout_secs: cli
                .exporter_timeout
                .or(file_exporter.timeout_secs)
                .unwrap_or(DEFAULT_EXPORTER_TIMEOUT_SECS),
            interval_ms: cli
                .export_interval
                .or(file_exporter.interval_ms)
                .unwrap_or(DEFAULT_EXPORT_INTERVAL_MS),
            service_name: cli
                .service_name
                .clone()
                .or(file_exporter.service_name)
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            service_version: file_exporter
                .service_version
                .unwrap_or_else(|| DEFAULT_SERVICE_VERSION.to_string()),
        };

        let extract = ExtractConfig {
            value_selection: cli
                .value_selection
                .or(file_extract.value_selection)
                .unwrap_or_default(),
        };

        let config = Self {
            bus,
            exporter,
            extract,
        };

        tracing::debug!(
            bus = %config.bus.backend,
            topic = %config.bus.topic,
            exporter = %config.exporter.endpoint,
            interval_ms = config.exporter.interval_ms,
            value_selection = %config.extract.value_selection,
            "Configuration loaded"
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.bus.backend == BusBackendType::Kafka {
            if self.bus.brokers.trim().is_empty() {
                anyhow::bail!("Configuration error: bus.brokers must not be empty");
            }
            if self.bus.topic.trim().is_empty() {
                anyhow::bail!("Configuration error: bus.topic must not be empty");
            }
            if self.bus.group_id.trim().is_empty() {
                anyhow::bail!("Configuration error: bus.group_id must not be empty");
            }
        }

        if self.exporter.interval_ms == 0 {
            anyhow::bail!("Configuration error: exporter.interval_ms must be greater than 0");
        }
        if self.exporter.timeout_secs == 0 {
            anyhow::bail!("Configuration error: exporter.timeout_secs must be greater than 0");
        }
        if self.exporter.service_name.is_empty() {
            anyhow::bail!("Configuration error: exporter.service_name must not be empty");
        }

        let scheme = if self.exporter.insecure {
            "http://"
        } else {
            "https://"
        };
        if !self.exporter.endpoint.starts_with(scheme) {
            anyhow::bail!(
                "Configuration error: exporter.endpoint ({}) must start with {} when exporter.insecure is {}",
                self.exporter.endpoint,
                scheme,
                self.exporter.insecure
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.metricbridge/metricbridge.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
