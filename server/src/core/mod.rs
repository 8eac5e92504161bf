//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;
pub mod telemetry;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, BusConfig, ExporterConfig, ExtractConfig, ValueSelection};
pub use shutdown::ShutdownService;
pub use telemetry::{MeterGuard, TelemetryError, init_meter_provider};
