//! Implementation of the `phantom form-data` command.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::commands::{build_scheduler, load_config};
use crate::cli::output::{key_value_table, output, CommandOutput};
use crate::domain::models::FormData;

/// Generated form data.
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct FormDataOutput(pub FormData);

impl CommandOutput for FormDataOutput {
    fn to_human(&self) -> String {
        let f = &self.0;
        let rows = [
            ("First name", &f.first_name),
            ("Last name", &f.last_name),
            ("Email", &f.email),
            ("Phone", &f.phone),
            ("Address", &f.address),
            ("City", &f.city),
            ("State", &f.state),
            ("ZIP", &f.zip),
            ("Company", &f.company),
            ("Job title", &f.job_title),
        ];
        key_value_table(
            rows.into_iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key, value.clone())),
        )
        .to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Generate form data for the active persona.
pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let scheduler = build_scheduler(config).await?;
    let data = scheduler.form_data().await.context("Failed to generate form data")?;
    output(&FormDataOutput(data), json_mode);
    Ok(())
}
