//! In-memory PersonaRepository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Persona;
use crate::domain::ports::PersonaRepository;

/// Persona store held in memory.
#[derive(Default)]
pub struct InMemoryPersonaRepository {
    personas: RwLock<Vec<Persona>>,
}

impl InMemoryPersonaRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonaRepository for InMemoryPersonaRepository {
    async fn find_active_persona(&self) -> DomainResult<Option<Persona>> {
        let personas = self.personas.read().await;
        Ok(personas
            .iter()
            .filter(|p| p.is_active)
            .max_by_key(|p| (p.updated_at, p.created_at))
            .cloned())
    }

    async fn activate(&self, persona: &Persona) -> DomainResult<()> {
        let mut personas = self.personas.write().await;
        for other in personas.iter_mut().filter(|p| p.id != persona.id) {
            other.is_active = false;
        }

        let mut stored = persona.clone();
        stored.is_active = true;
        match personas.iter_mut().find(|p| p.id == persona.id) {
            Some(existing) => {
                stored.created_at = existing.created_at;
                *existing = stored;
            }
            None => personas.push(stored),
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Persona>> {
        let personas = self.personas.read().await;
        Ok(personas.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Persona>> {
        let mut personas = self.personas.read().await.clone();
        personas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(personas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::persona::fixtures::sample_profile;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_activate_deactivates_previous() {
        let repo = InMemoryPersonaRepository::new();
        let now = Utc::now();
        let first = Persona::new(sample_profile(), now);
        let second = Persona::new(sample_profile(), now + Duration::hours(1));

        repo.activate(&first).await.unwrap();
        repo.activate(&second).await.unwrap();

        assert_eq!(repo.find_active_persona().await.unwrap().unwrap().id, second.id);
        assert!(!repo.get(first.id).await.unwrap().unwrap().is_active);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let repo = InMemoryPersonaRepository::new();
        assert!(repo.find_active_persona().await.unwrap().is_none());
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
