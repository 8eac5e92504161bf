// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "MetricBridge";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "metricbridge";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".metricbridge";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "metricbridge.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "METRICBRIDGE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "METRICBRIDGE_LOG";

// =============================================================================
// Environment Variables - Message Bus
// =============================================================================

/// Environment variable for bus backend (kafka or stdin)
pub const ENV_BUS_BACKEND: &str = "METRICBRIDGE_BUS_BACKEND";

/// Environment variable for Kafka bootstrap servers
pub const ENV_KAFKA_BROKERS: &str = "METRICBRIDGE_KAFKA_BROKERS";

/// Environment variable for Kafka topic
pub const ENV_KAFKA_TOPIC: &str = "METRICBRIDGE_KAFKA_TOPIC";

/// Environment variable for Kafka consumer group id
pub const ENV_KAFKA_GROUP_ID: &str = "METRICBRIDGE_KAFKA_GROUP_ID";

/// Environment variable for Kafka offset reset policy (earliest or latest)
pub const ENV_KAFKA_AUTO_OFFSET_RESET: &str = "METRICBRIDGE_KAFKA_AUTO_OFFSET_RESET";

// =============================================================================
// Message Bus Defaults
// =============================================================================

/// Default Kafka bootstrap servers
pub const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";

/// Default Kafka topic
pub const DEFAULT_KAFKA_TOPIC: &str = "test-topic";

/// Default Kafka consumer group id
pub const DEFAULT_KAFKA_GROUP_ID: &str = "my-group";

/// Kafka consumer session timeout in milliseconds
pub const DEFAULT_KAFKA_SESSION_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Environment Variables - Exporter
// =============================================================================

/// Environment variable for the OTLP exporter endpoint
pub const ENV_EXPORTER_ENDPOINT: &str = "METRICBRIDGE_EXPORTER_ENDPOINT";

/// Environment variable for plaintext exporter transport
pub const ENV_EXPORTER_INSECURE: &str = "METRICBRIDGE_EXPORTER_INSECURE";

/// Environment variable for exporter request timeout in seconds
pub const ENV_EXPORTER_TIMEOUT_SECS: &str = "METRICBRIDGE_EXPORTER_TIMEOUT_SECS";

/// Environment variable for export interval in milliseconds
pub const ENV_EXPORT_INTERVAL_MS: &str = "METRICBRIDGE_EXPORT_INTERVAL_MS";

/// Environment variable for the reported service name
pub const ENV_SERVICE_NAME: &str = "METRICBRIDGE_SERVICE_NAME";

// =============================================================================
// Exporter Defaults
// =============================================================================

/// Default OTLP gRPC endpoint (standard OTLP gRPC port)
pub const DEFAULT_EXPORTER_ENDPOINT: &str = "http://localhost:4317";

/// Default exporter request timeout in seconds
pub const DEFAULT_EXPORTER_TIMEOUT_SECS: u64 = 30;

/// Default export interval in milliseconds
pub const DEFAULT_EXPORT_INTERVAL_MS: u64 = 2_000;

/// Default `service.name` resource attribute
pub const DEFAULT_SERVICE_NAME: &str = "kafka-consumer";

/// Default `service.version` resource attribute
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";

// =============================================================================
// Extraction
// =============================================================================

/// Environment variable for data point value selection (nonzero or presence)
pub const ENV_VALUE_SELECTION: &str = "METRICBRIDGE_VALUE_SELECTION";

/// Prefix for metric names derived from generic record fields
pub const GENERIC_METRIC_PREFIX: &str = "kafka.";

/// Description prefix for metrics derived from generic record fields
pub const GENERIC_DESCRIPTION_PREFIX: &str = "Value from Kafka field: ";

/// Metric name used when an envelope descriptor carries no name
pub const UNKNOWN_METRIC_NAME: &str = "unknown";

/// Unit reported for every registered gauge
pub const METRIC_UNIT: &str = "1";

/// Attribute key attached to every observation
pub const SOURCE_ATTR_KEY: &str = "source";

/// Attribute value attached to every observation
pub const SOURCE_ATTR_VALUE: &str = "kafka";

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
