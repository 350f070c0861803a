//! Implementation of the `phantom status` command.

use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::Path;

use crate::cli::commands::{load_config, open_stores};
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::NoiseEventType;

/// Pending count for one event type.
#[derive(Debug, serde::Serialize)]
pub struct DepthRow {
    /// Event type name.
    pub event_type: String,
    /// Undelivered events of that type.
    pub pending: u64,
}

/// Queue and persona overview.
#[derive(Debug, serde::Serialize)]
pub struct StatusOutput {
    /// Whether scheduling is enabled in config.
    pub enabled: bool,
    /// Summary of the active persona.
    pub active_persona: Option<String>,
    /// Id of the active persona.
    pub persona_id: Option<String>,
    /// Undelivered events across all types.
    pub pending_total: u64,
    /// Undelivered events per type.
    pub pending_by_type: Vec<DepthRow>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Scheduler enabled: {}", if self.enabled { "yes" } else { "no" }),
            format!(
                "Active persona:    {}",
                self.active_persona.as_deref().unwrap_or("none")
            ),
            format!("Pending events:    {}", self.pending_total),
        ];

        let mut depths = table(["Event type", "Pending"]);
        for row in &self.pending_by_type {
            depths.add_row(vec![Cell::new(&row.event_type), Cell::new(row.pending)]);
        }
        lines.push(String::new());
        lines.push(depths.to_string());
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Print queue depth and the active persona.
pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let stores = open_stores(&config).await?;

    let mut pending_by_type = Vec::with_capacity(NoiseEventType::ALL.len());
    for event_type in NoiseEventType::ALL {
        let pending = stores
            .events
            .count_undelivered(Some(event_type))
            .await
            .with_context(|| format!("Failed to count pending {event_type} events"))?;
        pending_by_type.push(DepthRow {
            event_type: event_type.to_string(),
            pending,
        });
    }

    let persona = stores
        .personas
        .find_active_persona()
        .await
        .context("Failed to load active persona")?;

    let status = StatusOutput {
        enabled: config.scheduler.enabled,
        active_persona: persona.as_ref().map(|p| p.summary()),
        persona_id: persona.as_ref().map(|p| p.id.to_string()),
        pending_total: pending_by_type.iter().map(|r| r.pending).sum(),
        pending_by_type,
    };
    output(&status, json_mode);
    Ok(())
}
