//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::core::telemetry;
use crate::data::bus::{BusBackend, create_bus};
use crate::domain::{MetricsEngine, MetricsPipeline, OtelInstruments};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub engine: Arc<MetricsEngine>,
    pub bus: Arc<dyn BusBackend>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Config) => return Self::print_config(&cli_config),
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let telemetry = Arc::new(
            telemetry::init_meter_provider(&config.exporter)
                .context("Failed to initialize metrics export")?,
        );
        let meter = telemetry.meter(
            &config.exporter.service_name,
            &config.exporter.service_version,
        );

        let engine = Arc::new(MetricsEngine::new(
            Arc::new(OtelInstruments::new(meter)),
            config.extract.value_selection,
        ));

        let bus = create_bus(&config.bus)
            .with_context(|| format!("Failed to create {} bus consumer", config.bus.backend))?;
        tracing::debug!(backend = bus.backend_name(), "Bus consumer initialized");

        let shutdown = ShutdownService::new(telemetry);

        Ok(Self {
            shutdown,
            config,
            engine,
            bus,
        })
    }

    fn print_config(cli: &CliConfig) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let json = serde_json::to_string_pretty(&config).context("Failed to render config")?;
        println!("{}", json);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        tracing::info!(
            backend = %app.config.bus.backend,
            topic = %app.config.bus.topic,
            group_id = %app.config.bus.group_id,
            endpoint = %app.config.exporter.endpoint,
            interval_ms = app.config.exporter.interval_ms,
            value_selection = %app.config.extract.value_selection,
            "Starting {}",
            APP_NAME
        );

        let pipeline = MetricsPipeline::new(app.engine.clone());
        let ingestion = pipeline
            .start(app.bus.clone(), app.shutdown.subscribe())
            .await
            .context("Failed to subscribe to message bus")?;

        // A closed bus stream (e.g. stdin EOF) ends the process the same way a signal does
        let service = app.shutdown.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = ingestion.await {
                tracing::error!(error = %e, "MetricsPipeline task failed");
            }
            if !service.is_triggered() {
                tracing::info!("Message bus closed, shutting down");
                service.trigger();
            }
        });
        app.shutdown.register(handle).await;

        app.shutdown.wait().await;
        app.shutdown.shutdown().await;

        tracing::info!(
            registered_metrics = app.engine.registered_count(),
            "Shutdown complete"
        );
        Ok(())
    }
}
