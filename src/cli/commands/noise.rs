//! Noise CLI commands for consuming generated events.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use std::path::Path;

use crate::cli::commands::{load_config, open_stores};
use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::domain::models::{NoiseEvent, NoiseEventType};
use crate::services::NoiseQueue;

/// Largest batch a single `noise pop` may take.
pub const MAX_POP_LIMIT: usize = 100;

/// Arguments for `phantom noise`.
#[derive(Args, Debug)]
pub struct NoiseArgs {
    /// Noise subcommand.
    #[command(subcommand)]
    pub command: NoiseCommands,
}

/// Noise subcommands.
#[derive(Subcommand, Debug)]
pub enum NoiseCommands {
    /// Take pending events, marking them delivered
    Pop {
        /// Only events of this type (search, browse, shop, persona_rotate)
        #[arg(long = "type", short = 't')]
        event_type: Option<String>,

        /// Maximum number of events (at most 100)
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },
}

/// One delivered noise event.
#[derive(Debug, serde::Serialize)]
pub struct NoiseEventOutput {
    /// Event id.
    pub id: String,
    /// Event type name.
    pub event_type: String,
    /// Persona the event was generated for.
    pub persona_id: Option<String>,
    /// Type-specific payload.
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// Creation time (RFC3339).
    pub created_at: String,
}

impl From<&NoiseEvent> for NoiseEventOutput {
    fn from(event: &NoiseEvent) -> Self {
        Self {
            id: event.id.to_string(),
            event_type: event.event_type().to_string(),
            persona_id: event.persona_id.map(|id| id.to_string()),
            payload: event.payload.clone(),
            created_at: event.created_at().to_rfc3339(),
        }
    }
}

/// Events claimed by one pop.
#[derive(Debug, serde::Serialize)]
pub struct NoisePopOutput {
    /// The claimed events, oldest first.
    pub events: Vec<NoiseEventOutput>,
    /// Number of events claimed.
    pub total: usize,
}

impl CommandOutput for NoisePopOutput {
    fn to_human(&self) -> String {
        if self.events.is_empty() {
            return "No pending noise events.".to_string();
        }

        let mut events = table(["ID", "Type", "Value", "Created"]);
        for event in &self.events {
            let value = event
                .payload
                .values()
                .next()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .unwrap_or_default();
            events.add_row(vec![
                Cell::new(&event.id[..8]),
                Cell::new(&event.event_type),
                Cell::new(truncate(&value, 60)),
                Cell::new(&event.created_at),
            ]);
        }
        format!("{events}\n\n{} event(s) delivered.", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Parse the `--type` filter.
pub fn parse_event_type(raw: Option<&str>) -> Result<Option<NoiseEventType>> {
    raw.map(|s| s.parse::<NoiseEventType>().map_err(anyhow::Error::msg))
        .transpose()
}

/// Run a noise subcommand.
pub async fn execute(args: NoiseArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    match args.command {
        NoiseCommands::Pop { event_type, limit } => {
            let event_type = parse_event_type(event_type.as_deref())?;
            let limit = limit.min(MAX_POP_LIMIT);

            let config = load_config(config_path)?;
            let stores = open_stores(&config).await?;
            let queue = NoiseQueue::new(stores.events, &config.queue);

            let events = queue
                .pop_batch(event_type, limit)
                .await
                .context("Failed to pop noise events")?;
            let out = NoisePopOutput {
                total: events.len(),
                events: events.iter().map(NoiseEventOutput::from).collect(),
            };
            output(&out, json_mode);
        }
    }
    Ok(())
}
