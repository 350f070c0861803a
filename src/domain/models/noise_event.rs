//! Noise event domain model.
//!
//! A noise event is one decoy action (a search, a page visit, a product view
//! or a persona change) waiting for a consumer to act it out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of decoy action. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseEventType {
    /// A search query to issue.
    Search,
    /// A page to visit.
    Browse,
    /// A product to look at.
    Shop,
    /// The active persona changed.
    PersonaRotate,
}

impl NoiseEventType {
    /// All event types, in display order.
    pub const ALL: [Self; 4] = [Self::Search, Self::Browse, Self::Shop, Self::PersonaRotate];

    /// Stored and serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Browse => "browse",
            Self::Shop => "shop",
            Self::PersonaRotate => "persona_rotate",
        }
    }

    /// Payload key that carries the event's main value.
    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::Search => "query",
            Self::Browse => "url",
            Self::Shop => "product",
            Self::PersonaRotate => "persona",
        }
    }
}

impl fmt::Display for NoiseEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Self::Search),
            "browse" => Ok(Self::Browse),
            "shop" => Ok(Self::Shop),
            "persona_rotate" => Ok(Self::PersonaRotate),
            other => Err(format!("unknown noise event type: {other}")),
        }
    }
}

/// A single decoy action record.
///
/// `event_type` and `created_at` are fixed at construction; only
/// `delivered` changes afterwards, and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvent {
    /// Event id.
    pub id: Uuid,
    /// Persona the event was generated for.
    pub persona_id: Option<Uuid>,
    event_type: NoiseEventType,
    /// Type-specific payload.
    pub payload: Map<String, Value>,
    /// Whether a consumer has received this event.
    pub delivered: bool,
    created_at: DateTime<Utc>,
}

impl NoiseEvent {
    /// Create an undelivered event with a single-entry payload keyed by the
    /// event type (`query`, `url`, `product` or `persona`).
    pub fn new(
        event_type: NoiseEventType,
        persona_id: Option<Uuid>,
        value: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert(event_type.payload_key().to_string(), Value::String(value.into()));
        Self::with_payload(event_type, persona_id, payload, created_at)
    }

    /// New undelivered event with an explicit payload.
    pub fn with_payload(
        event_type: NoiseEventType,
        persona_id: Option<Uuid>,
        payload: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            persona_id,
            event_type,
            payload,
            delivered: false,
            created_at,
        }
    }

    /// Rebuild an event from storage.
    pub fn restore(
        id: Uuid,
        persona_id: Option<Uuid>,
        event_type: NoiseEventType,
        payload: Map<String, Value>,
        delivered: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            persona_id,
            event_type,
            payload,
            delivered,
            created_at,
        }
    }

    /// Search query event.
    pub fn search(persona_id: Option<Uuid>, query: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(NoiseEventType::Search, persona_id, query, at)
    }

    /// Page visit event.
    pub fn browse(persona_id: Option<Uuid>, url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(NoiseEventType::Browse, persona_id, url, at)
    }

    /// Product view event.
    pub fn shop(persona_id: Option<Uuid>, product: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(NoiseEventType::Shop, persona_id, product, at)
    }

    /// Persona rotation event carrying the new persona's summary.
    pub fn persona_rotate(persona_id: Option<Uuid>, summary: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(NoiseEventType::PersonaRotate, persona_id, summary, at)
    }

    /// The event's type.
    pub fn event_type(&self) -> NoiseEventType {
        self.event_type
    }

    /// When the event was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The payload's main value, if it is a string.
    pub fn primary_value(&self) -> Option<&str> {
        self.payload
            .get(self.event_type.payload_key())
            .and_then(Value::as_str)
    }

    /// Mark as delivered. Idempotent.
    pub fn mark_delivered(&mut self) {
        self.delivered = true;
    }
}
