//! Persona rotation policy and the scheduler's persona state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::Persona;

/// Decides when the active persona is due for replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    interval_secs: i64,
}

impl RotationPolicy {
    /// Policy that rotates every `hours` hours.
    pub fn from_hours(hours: u64) -> Self {
        let secs = hours.saturating_mul(3600);
        Self {
            interval_secs: i64::try_from(secs).unwrap_or(i64::MAX),
        }
    }

    /// Due when no rotation has happened yet, or when strictly more than the
    /// interval has elapsed since the last one.
    pub fn is_due(&self, last_rotation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_rotation {
            None => true,
            Some(last) => (now - last).num_seconds() > self.interval_secs,
        }
    }
}

/// Persona view shared between the scheduler loops.
///
/// Written by the persona loop and forced rotations only; the search and
/// browsing loops read the repository directly and tolerate this being stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaState {
    /// Id of the persona last seen or rotated in.
    pub persona_id: Option<Uuid>,
    /// That persona's summary, as fed to the generator.
    pub summary: Option<String>,
    /// When the current persona was activated.
    pub last_rotation: Option<DateTime<Utc>>,
}

impl PersonaState {
    /// Record a rotation performed by this scheduler.
    pub fn rotated(&mut self, persona: &Persona, at: DateTime<Utc>) {
        self.persona_id = Some(persona.id);
        self.summary = Some(persona.summary());
        self.last_rotation = Some(at);
    }

    /// Refresh from the stored active persona.
    ///
    /// The rotation clock moves forward to the persona's `updated_at` when
    /// that is newer, so a persona activated elsewhere (another process, or
    /// before a restart) counts as the latest rotation.
    pub fn observe(&mut self, persona: Option<&Persona>) {
        self.persona_id = persona.map(|p| p.id);
        self.summary = persona.map(Persona::summary);
        if let Some(persona) = persona {
            if self.last_rotation.map_or(true, |last| last < persona.updated_at) {
                self.last_rotation = Some(persona.updated_at);
            }
        }
    }
}
