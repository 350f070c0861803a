//! Persona domain model.
//!
//! A persona is the synthetic identity whose interests give the generated
//! noise a coherent theme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of interests included in a persona summary.
const SUMMARY_INTERESTS: usize = 5;

/// Structured profile produced by the content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// City and region.
    pub location: String,
    /// Job or profession.
    #[serde(alias = "profession")]
    pub occupation: String,
    /// Hobbies and interests.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Free-form personality description.
    #[serde(default)]
    pub personality_notes: String,
    /// Topics the persona searches for.
    #[serde(default)]
    pub search_topics: Vec<String>,
    /// Sites the persona visits often.
    #[serde(default)]
    pub favorite_sites: Vec<String>,
    /// Product categories the persona shops for.
    #[serde(default)]
    pub shopping_interests: Vec<String>,
    /// Short personality traits.
    #[serde(default)]
    pub personality_traits: Vec<String>,
    /// Typical day, in prose.
    #[serde(default)]
    pub daily_routine: String,
}

impl PersonaProfile {
    /// Short description fed back into generation prompts.
    pub fn summary(&self) -> String {
        let interests: Vec<&str> = self
            .interests
            .iter()
            .take(SUMMARY_INTERESTS)
            .map(String::as_str)
            .collect();
        format!(
            "{}, age {}, {} from {}. Interests: {}",
            self.name,
            self.age,
            self.occupation,
            self.location,
            interests.join(", ")
        )
    }
}

/// A stored persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Persona id.
    pub id: Uuid,
    /// Generated profile.
    pub profile: PersonaProfile,
    /// Whether this is the active persona.
    pub is_active: bool,
    /// When the persona was created.
    pub created_at: DateTime<Utc>,
    /// When the persona was last activated or changed.
    pub updated_at: DateTime<Utc>,
}

impl Persona {
    /// Wrap a freshly generated profile. The persona starts inactive; the
    /// repository's `activate` makes it the single active one.
    pub fn new(profile: PersonaProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The persona's name.
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// One-paragraph description fed to the generator.
    pub fn summary(&self) -> String {
        self.profile.summary()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::PersonaProfile;

    pub fn sample_profile() -> PersonaProfile {
        PersonaProfile {
            name: "Dana Whitfield".into(),
            age: 41,
            location: "Tucson, AZ".into(),
            occupation: "hydrologist".into(),
            interests: vec![
                "desert gardening".into(),
                "ham radio".into(),
                "sourdough".into(),
                "trail running".into(),
                "birding".into(),
                "vintage synths".into(),
            ],
            personality_notes: String::new(),
            search_topics: vec![],
            favorite_sites: vec![],
            shopping_interests: vec![],
            personality_traits: vec![],
            daily_routine: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_profile;
    use super::*;

    #[test]
    fn test_summary_keeps_first_five_interests() {
        let summary = sample_profile().summary();
        assert_eq!(
            summary,
            "Dana Whitfield, age 41, hydrologist from Tucson, AZ. \
             Interests: desert gardening, ham radio, sourdough, trail running, birding"
        );
        assert!(!summary.contains("vintage synths"));
    }

    #[test]
    fn test_profile_accepts_profession_alias_and_defaults() {
        let json = r#"{"name":"Lee","age":29,"location":"Boise, ID","profession":"welder"}"#;
        let profile: PersonaProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.occupation, "welder");
        assert!(profile.interests.is_empty());
        assert!(profile.daily_routine.is_empty());
    }

    #[test]
    fn test_new_persona_starts_inactive() {
        let persona = Persona::new(sample_profile(), Utc::now());
        assert!(!persona.is_active);
        assert_eq!(persona.created_at, persona.updated_at);
        assert_eq!(persona.name(), "Dana Whitfield");
    }
}
