//! Implementation of the `phantom run` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::commands::{build_scheduler, load_config};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::SchedulerStats;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

/// Interval between periodic status log lines.
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(300);

/// Final state of a daemon run.
#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    /// Whether the scheduler started.
    pub started: bool,
    /// Counters at shutdown.
    pub stats: SchedulerStats,
    /// Undelivered events at shutdown.
    pub queue_depth: u64,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        if !self.started {
            return "Noise scheduler is disabled in configuration; nothing to run.".to_string();
        }
        format!(
            "Noise scheduler stopped. Generated {} searches, {} pages, {} products, {} persona rotations ({} loop failures). {} events pending.",
            self.stats.searches_generated,
            self.stats.pages_generated,
            self.stats.products_generated,
            self.stats.persona_rotations,
            self.stats.loop_failures,
            self.queue_depth,
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run the scheduler until Ctrl-C.
pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging)).context("Failed to initialize logging")?;

    let scheduler = build_scheduler(config).await?;

    if !scheduler.start().await {
        output(
            &RunOutput {
                started: false,
                stats: scheduler.stats(),
                queue_depth: scheduler.queue_depth().await?,
            },
            json_mode,
        );
        return Ok(());
    }

    let mut ticker = tokio::time::interval(STATUS_LOG_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scheduler.status().await {
                    Ok(status) => info!(
                        persona = status.persona.as_deref().unwrap_or("none"),
                        queue_depth = status.queue_depth,
                        searches = status.stats.searches_generated,
                        pages = status.stats.pages_generated,
                        products = status.stats.products_generated,
                        rotations = status.stats.persona_rotations,
                        loop_failures = status.stats.loop_failures,
                        "noise scheduler status"
                    ),
                    Err(err) => warn!(error = %err, "failed to read scheduler status"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for ctrl-c; shutting down");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    scheduler.stop().await;

    output(
        &RunOutput {
            started: true,
            stats: scheduler.stats(),
            queue_depth: scheduler.queue_depth().await?,
        },
        json_mode,
    );
    Ok(())
}
