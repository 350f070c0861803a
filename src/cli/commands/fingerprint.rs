//! Implementation of the `phantom fingerprint` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::Path;

use crate::cli::commands::load_config;
use crate::cli::output::{key_value_table, output, CommandOutput};
use crate::domain::models::{fingerprint_at, FingerprintProfile};

/// Arguments for `phantom fingerprint`.
#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Compute the fingerprint for this time (RFC3339) instead of now
    #[arg(long)]
    pub at: Option<String>,
}

/// Fingerprint for a point in time.
#[derive(Debug, serde::Serialize)]
pub struct FingerprintOutput {
    /// The instant the fingerprint was computed for (RFC3339).
    pub at: String,
    /// Configured rotation interval.
    pub rotation_interval_mins: u64,
    /// The fingerprint itself.
    #[serde(flatten)]
    pub profile: FingerprintProfile,
}

impl CommandOutput for FingerprintOutput {
    fn to_human(&self) -> String {
        let p = &self.profile;
        let rows = [
            ("At", self.at.clone()),
            ("Screen", format!("{}x{}", p.screen_width, p.screen_height)),
            ("Timezone", p.timezone.clone()),
            ("Language", p.language.clone()),
            ("Platform", p.platform.clone()),
            ("Canvas seed", p.canvas_seed.to_string()),
            ("WebGL seed", p.webgl_seed.to_string()),
        ];
        format!(
            "{}\nRotates every {} minute(s).",
            key_value_table(rows),
            self.rotation_interval_mins
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn parse_at(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --at timestamp (expected RFC3339): {s}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Print the fingerprint for now or `--at`.
pub async fn execute(args: FingerprintArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let at = parse_at(args.at.as_deref())?;

    let out = FingerprintOutput {
        at: at.to_rfc3339(),
        rotation_interval_mins: config.fingerprint.rotation_interval_mins,
        profile: fingerprint_at(at, config.fingerprint.rotation_interval_secs()),
    };
    output(&out, json_mode);
    Ok(())
}
