use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::{BusBackendType, OffsetReset, ValueSelection};
use super::constants::{
    ENV_BUS_BACKEND, ENV_CONFIG, ENV_EXPORT_INTERVAL_MS, ENV_EXPORTER_ENDPOINT,
    ENV_EXPORTER_INSECURE, ENV_EXPORTER_TIMEOUT_SECS, ENV_KAFKA_AUTO_OFFSET_RESET,
    ENV_KAFKA_BROKERS, ENV_KAFKA_GROUP_ID, ENV_KAFKA_TOPIC, ENV_SERVICE_NAME,
    ENV_VALUE_SELECTION,
};

#[derive(Parser)]
#[command(name = "metricbridge")]
#[command(version, about = "Republish message bus records as OpenTelemetry gauges", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Message bus backend (kafka or stdin)
    #[arg(long, global = true, env = ENV_BUS_BACKEND, value_parser = parse_bus_backend)]
    pub bus: Option<BusBackendType>,

    /// Kafka bootstrap servers (comma separated)
    #[arg(long, short = 'b', global = true, env = ENV_KAFKA_BROKERS)]
    pub brokers: Option<String>,

    /// Kafka topic to consume
    #[arg(long, short = 't', global = true, env = ENV_KAFKA_TOPIC)]
    pub topic: Option<String>,

    /// Kafka consumer group id
    #[arg(long, short = 'g', global = true, env = ENV_KAFKA_GROUP_ID)]
    pub group_id: Option<String>,

    /// Offset reset policy when the group has no committed offset (earliest or latest)
    #[arg(long, global = true, env = ENV_KAFKA_AUTO_OFFSET_RESET, value_parser = parse_offset_reset)]
    pub auto_offset_reset: Option<OffsetReset>,

    /// OTLP gRPC endpoint of the metrics backend
    #[arg(long, short = 'e', global = true, env = ENV_EXPORTER_ENDPOINT)]
    pub exporter_endpoint: Option<String>,

    /// Use plaintext transport to the exporter endpoint
    #[arg(long, global = true, env = ENV_EXPORTER_INSECURE)]
    pub exporter_insecure: Option<bool>,

    /// Exporter request timeout in seconds
    #[arg(long, global = true, env = ENV_EXPORTER_TIMEOUT_SECS)]
    pub exporter_timeout: Option<u64>,

    /// Export interval in milliseconds
    #[arg(long, global = true, env = ENV_EXPORT_INTERVAL_MS)]
    pub export_interval: Option<u64>,

    /// Reported service.name resource attribute
    #[arg(long, global = true, env = ENV_SERVICE_NAME)]
    pub service_name: Option<String>,

    /// Gauge data point value selection (nonzero or presence)
    #[arg(long, global = true, env = ENV_VALUE_SELECTION, value_parser = parse_value_selection)]
    pub value_selection: Option<ValueSelection>,
}

/// Parse bus backend from CLI/env string
fn parse_bus_backend(s: &str) -> Result<BusBackendType, String> {
    match s.to_lowercase().as_str() {
        "kafka" => Ok(BusBackendType::Kafka),
        "stdin" => Ok(BusBackendType::Stdin),
        _ => Err(format!(
            "Invalid bus backend '{}'. Valid options: kafka, stdin",
            s
        )),
    }
}

/// Parse offset reset policy from CLI/env string
fn parse_offset_reset(s: &str) -> Result<OffsetReset, String> {
    match s.to_lowercase().as_str() {
        "earliest" | "smallest" => Ok(OffsetReset::Earliest),
        "latest" | "largest" => Ok(OffsetReset::Latest),
        _ => Err(format!(
            "Invalid offset reset policy '{}'. Valid options: earliest, latest",
            s
        )),
    }
}

/// Parse value selection from CLI/env string
fn parse_value_selection(s: &str) -> Result<ValueSelection, String> {
    match s.to_lowercase().as_str() {
        "nonzero" | "non-zero" => Ok(ValueSelection::NonZero),
        "presence" => Ok(ValueSelection::Presence),
        _ => Err(format!(
            "Invalid value selection '{}'. Valid options: nonzero, presence",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start consuming (default command)
    Start,
    /// Print the merged configuration and exit
    Config,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub bus: Option<BusBackendType>,
    pub brokers: Option<String>,
    pub topic: Option<String>,
    pub group_id: Option<String>,
    pub auto_offset_reset: Option<OffsetReset>,
    pub exporter_endpoint: Option<String>,
    pub exporter_insecure: Option<bool>,
    pub exporter_timeout: Option<u64>,
    pub export_interval: Option<u64>,
    pub service_name: Option<String>,
    pub value_selection: Option<ValueSelection>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        bus: cli.bus,
        brokers: cli.brokers,
        topic: cli.topic,
        group_id: cli.group_id,
        auto_offset_reset: cli.auto_offset_reset,
        exporter_endpoint: cli.exporter_endpoint,
        exporter_insecure: cli.exporter_insecure,
        exporter_timeout: cli.exporter_timeout,
        export_interval: cli.export_interval,
        service_name: cli.service_name,
        value_selection: cli.value_selection,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bus_backend() {
        assert_eq!(parse_bus_backend("kafka").unwrap(), BusBackendType::Kafka);
        assert_eq!(parse_bus_backend("STDIN").unwrap(), BusBackendType::Stdin);
        assert!(parse_bus_backend("redis").is_err());
    }

    #[test]
    fn test_parse_offset_reset_aliases() {
        assert_eq!(parse_offset_reset("earliest").unwrap(), OffsetReset::Earliest);
        assert_eq!(parse_offset_reset("smallest").unwrap(), OffsetReset::Earliest);
        assert_eq!(parse_offset_reset("Latest").unwrap(), OffsetReset::Latest);
        assert!(parse_offset_reset("none").is_err());
    }

    #[test]
    fn test_parse_value_selection() {
        assert_eq!(
            parse_value_selection("nonzero").unwrap(),
            ValueSelection::NonZero
        );
        assert_eq!(
            parse_value_selection("presence").unwrap(),
            ValueSelection::Presence
        );
        let err = parse_value_selection("truthy").unwrap_err();
        assert!(err.contains("nonzero, presence"));
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "metricbridge",
            "--brokers",
            "kafka-1:9092,kafka-2:9092",
            "--topic",
            "events",
            "--export-interval",
            "5000",
            "--value-selection",
            "presence",
            "start",
        ])
        .unwrap();

        assert_eq!(cli.brokers.as_deref(), Some("kafka-1:9092,kafka-2:9092"));
        assert_eq!(cli.topic.as_deref(), Some("events"));
        assert_eq!(cli.export_interval, Some(5000));
        assert_eq!(cli.value_selection, Some(ValueSelection::Presence));
        assert!(matches!(cli.command, Some(Commands::Start)));
    }
}
