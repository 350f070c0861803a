//! Persona CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::Path;

use crate::cli::commands::{build_scheduler, load_config, open_stores};
use crate::cli::output::{key_value_table, output, CommandOutput};
use crate::domain::models::Persona;

/// Arguments for `phantom persona`.
#[derive(Args, Debug)]
pub struct PersonaArgs {
    /// Persona subcommand.
    #[command(subcommand)]
    pub command: PersonaCommands,
}

/// Persona subcommands.
#[derive(Subcommand, Debug)]
pub enum PersonaCommands {
    /// Generate a new persona and make it active now
    Rotate,

    /// Show the active persona
    Show,
}

/// Active persona, and whether it was just rotated in.
#[derive(Debug, serde::Serialize)]
pub struct PersonaOutput {
    /// The active persona, if any.
    pub persona: Option<Persona>,
    /// Whether this command rotated it in.
    pub rotated: bool,
}

impl CommandOutput for PersonaOutput {
    fn to_human(&self) -> String {
        let Some(persona) = &self.persona else {
            return "No active persona. Run `phantom persona rotate` to create one.".to_string();
        };

        let profile = &persona.profile;
        let mut rows = vec![
            ("ID", persona.id.to_string()),
            ("Name", profile.name.clone()),
            ("Age", profile.age.to_string()),
            ("Location", profile.location.clone()),
            ("Occupation", profile.occupation.clone()),
            ("Interests", profile.interests.join(", ")),
        ];
        if !profile.shopping_interests.is_empty() {
            rows.push(("Shopping", profile.shopping_interests.join(", ")));
        }
        if !profile.favorite_sites.is_empty() {
            rows.push(("Sites", profile.favorite_sites.join(", ")));
        }
        rows.push(("Active since", persona.updated_at.to_rfc3339()));

        let header = if self.rotated { "Rotated to new persona:" } else { "Active persona:" };
        format!("{header}\n{}", key_value_table(rows))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a persona subcommand.
pub async fn execute(args: PersonaArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let out = match args.command {
        PersonaCommands::Rotate => {
            let scheduler = build_scheduler(config).await?;
            let persona = scheduler.force_rotation().await.context("Failed to rotate persona")?;
            PersonaOutput {
                persona: Some(persona),
                rotated: true,
            }
        }
        PersonaCommands::Show => {
            let stores = open_stores(&config).await?;
            let persona = stores
                .personas
                .find_active_persona()
                .await
                .context("Failed to load active persona")?;
            PersonaOutput {
                persona,
                rotated: false,
            }
        }
    };

    output(&out, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::persona::fixtures::sample_profile;
    use chrono::Utc;

    #[test]
    fn test_human_output_lists_profile() {
        let out = PersonaOutput {
            persona: Some(Persona::new(sample_profile(), Utc::now())),
            rotated: true,
        };
        let human = out.to_human();
        assert!(human.starts_with("Rotated to new persona:"));
        assert!(human.contains("Dana Whitfield"));
        assert!(human.contains("hydrologist"));
    }

    #[test]
    fn test_no_persona_message() {
        let out = PersonaOutput {
            persona: None,
            rotated: false,
        };
        assert!(out.to_human().contains("No active persona"));
        assert!(out.to_json()["persona"].is_null());
    }
}
