use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "market-snapshot".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err(AppError::Config("LOKI_ENABLED is true but LOKI_URL is not set".to_string()));
        }
        Ok(())
    }
}

/// Keeps the Loki shipper reachable so buffered events can be flushed before
/// the process exits. A no-op when logging only goes to the console.
#[derive(Default)]
pub struct LoggingGuard {
    #[cfg(feature = "loki")]
    loki: Option<(tracing_loki::BackgroundTaskController, tokio::task::JoinHandle<()>)>,
}

impl LoggingGuard {
    /// Flush pending log batches and stop the background shipper.
    pub async fn shutdown(self) {
        #[cfg(feature = "loki")]
        {
            if let Some((controller, task)) = self.loki {
                controller.shutdown().await;
                if tokio::time::timeout(LOKI_FLUSH_TIMEOUT, task).await.is_err() {
                    eprintln!("loki: pending logs not flushed within {:?}", LOKI_FLUSH_TIMEOUT);
                }
            }
        }
        #[cfg(not(feature = "loki"))]
        let _ = self;
    }
}

#[cfg(feature = "loki")]
const LOKI_FLUSH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

pub fn init_logging(config: LoggingConfig) -> Result<LoggingGuard, AppError> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    init_console_only(config)
}

fn init_console_only(config: LoggingConfig) -> Result<LoggingGuard, AppError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::debug!("📊 Console logging initialized");
    Ok(LoggingGuard::default())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> Result<LoggingGuard, AppError> {
    let url = url::Url::parse(loki_url)
        .map_err(|e| AppError::Config(format!("LOKI_URL: {}", e)))?;

    let (loki_layer, controller, task) = tracing_loki::builder()
        .label("service", &config.service_name)
        .and_then(|b| b.label("environment", &config.environment))
        .and_then(|b| b.build_controller_url(url))
        .map_err(|e| AppError::Config(format!("loki: {}", e)))?;

    // Spawn the background task that sends logs to Loki
    let task = tokio::spawn(task);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(LoggingGuard {
        loki: Some((controller, task)),
    })
}
