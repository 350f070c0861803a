//! SQLite adapter for PersonaRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{format_datetime, parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Persona, PersonaProfile};
use crate::domain::ports::PersonaRepository;

/// Persona store backed by SQLite.
#[derive(Clone)]
pub struct SqlitePersonaRepository {
    pool: SqlitePool,
}

impl SqlitePersonaRepository {
    /// Repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PersonaRow {
    id: String,
    profile: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

fn row_to_persona(row: PersonaRow) -> DomainResult<Persona> {
    let profile: PersonaProfile = serde_json::from_str(&row.profile)
        .map_err(|e| DomainError::SerializationError(format!("profile: {}", e)))?;

    Ok(Persona {
        id: parse_uuid(&row.id)?,
        profile,
        is_active: row.is_active,
        created_at: parse_datetime(&row.created_at)?,
        updated_at: parse_datetime(&row.updated_at)?,
    })
}

#[async_trait]
impl PersonaRepository for SqlitePersonaRepository {
    async fn find_active_persona(&self) -> DomainResult<Option<Persona>> {
        let row: Option<PersonaRow> = sqlx::query_as(
            "SELECT id, profile, is_active, created_at, updated_at FROM personas
             WHERE is_active = 1
             ORDER BY updated_at DESC, created_at DESC
             LIMIT 1"
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_persona).transpose()
    }

    async fn activate(&self, persona: &Persona) -> DomainResult<()> {
        let id = persona.id.to_string();
        let profile = serde_json::to_string(&persona.profile)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE personas SET is_active = 0 WHERE is_active = 1 AND id != ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO personas (id, name, profile, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                profile = excluded.profile,
                is_active = 1,
                updated_at = excluded.updated_at"
        )
        .bind(&id)
        .bind(persona.name())
        .bind(&profile)
        .bind(format_datetime(persona.created_at))
        .bind(format_datetime(persona.updated_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Persona>> {
        let row: Option<PersonaRow> = sqlx::query_as(
            "SELECT id, profile, is_active, created_at, updated_at FROM personas WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_persona).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Persona>> {
        let rows: Vec<PersonaRow> = sqlx::query_as(
            "SELECT id, profile, is_active, created_at, updated_at FROM personas
             ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_persona).collect()
    }
}
