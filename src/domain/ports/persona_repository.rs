//! Repository port for persona persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Persona;

/// Durable store of personas. At most one persona is active.
#[async_trait]
pub trait PersonaRepository: Send + Sync {
    /// The active persona. When storage somehow holds several, the most
    /// recently updated one wins.
    async fn find_active_persona(&self) -> DomainResult<Option<Persona>>;

    /// Store `persona` as the only active persona, deactivating all others
    /// in the same write.
    async fn activate(&self, persona: &Persona) -> DomainResult<()>;

    /// Get a persona by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Persona>>;

    /// All personas, newest first.
    async fn list(&self) -> DomainResult<Vec<Persona>>;
}
