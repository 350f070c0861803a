//! Generation requests and the structured shapes decoded from generator output.
//!
//! Decoding is two-stage: [`extract_structured_block`] finds the candidate
//! JSON in free-form text, then [`GeneratedContent::decode`] validates it
//! against the shape the request asked for.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::persona::PersonaProfile;

/// What the content generator is being asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    /// A new synthetic persona. `hint` optionally steers demographics.
    Persona { hint: Option<String> },
    /// Search engine queries for the given persona.
    SearchQueries { persona_summary: String, count: usize },
    /// URLs to visit and products to look at.
    BrowsingPlan {
        persona_summary: String,
        pages: usize,
        products: usize,
    },
    /// Fake form-fill data matching the persona.
    FormData { persona_summary: String },
}

impl GenerationRequest {
    /// The kind of content requested.
    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::Persona { .. } => GenerationKind::Persona,
            Self::SearchQueries { .. } => GenerationKind::SearchQueries,
            Self::BrowsingPlan { .. } => GenerationKind::BrowsingPlan,
            Self::FormData { .. } => GenerationKind::FormData,
        }
    }
}

/// Kinds of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationKind {
    /// See [`GenerationRequest::Persona`].
    Persona,
    /// See [`GenerationRequest::SearchQueries`].
    SearchQueries,
    /// See [`GenerationRequest::BrowsingPlan`].
    BrowsingPlan,
    /// See [`GenerationRequest::FormData`].
    FormData,
}

impl GenerationKind {
    /// Stable name used in logs and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::SearchQueries => "search_queries",
            Self::BrowsingPlan => "browsing_plan",
            Self::FormData => "form_data",
        }
    }
}

/// URLs and products for one browsing cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingPlan {
    /// Pages to visit.
    #[serde(default)]
    pub urls_to_visit: Vec<String>,
    /// Products to view.
    #[serde(default)]
    pub products_to_browse: Vec<String>,
}

/// Plausible but fake form-fill data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// State or region.
    #[serde(default)]
    pub state: String,
    /// Postal code.
    #[serde(default)]
    pub zip: String,
    /// Employer.
    #[serde(default)]
    pub company: String,
    /// Job title.
    #[serde(default)]
    pub job_title: String,
}

/// Search queries arrive either as a bare array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum QueryList {
    Bare(Vec<String>),
    Wrapped { queries: Vec<String> },
}

/// Output could not be decoded into the requested shape.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no structured block found in generator output")]
    Empty,
    #[error("invalid {kind} payload: {source}")]
    Invalid {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Decoded generator output, one variant per request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
    /// A persona profile.
    Persona(PersonaProfile),
    /// Search queries, possibly including empty strings.
    SearchQueries(Vec<String>),
    /// Pages and products to browse.
    BrowsingPlan(BrowsingPlan),
    /// Form-fill data.
    FormData(FormData),
}

impl GeneratedContent {
    /// Decode a structured block into the shape expected for `kind`.
    pub fn decode(kind: GenerationKind, block: &str) -> Result<Self, DecodeError> {
        let invalid = |source| DecodeError::Invalid {
            kind: kind.as_str(),
            source,
        };
        match kind {
            GenerationKind::Persona => serde_json::from_str(block).map(Self::Persona).map_err(invalid),
            GenerationKind::SearchQueries => serde_json::from_str::<QueryList>(block)
                .map(|list| match list {
                    QueryList::Bare(queries) | QueryList::Wrapped { queries } => {
                        Self::SearchQueries(queries)
                    }
                })
                .map_err(invalid),
            GenerationKind::BrowsingPlan => {
                serde_json::from_str(block).map(Self::BrowsingPlan).map_err(invalid)
            }
            GenerationKind::FormData => serde_json::from_str(block).map(Self::FormData).map_err(invalid),
        }
    }

    /// Extract and decode in one step.
    pub fn parse(kind: GenerationKind, raw: &str) -> Result<Self, DecodeError> {
        let block = extract_structured_block(raw).ok_or(DecodeError::Empty)?;
        Self::decode(kind, block)
    }

    /// The kind of content decoded.
    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::Persona(_) => GenerationKind::Persona,
            Self::SearchQueries(_) => GenerationKind::SearchQueries,
            Self::BrowsingPlan(_) => GenerationKind::BrowsingPlan,
            Self::FormData(_) => GenerationKind::FormData,
        }
    }
}

/// Locate the structured payload in free-form generator text.
///
/// Returns the body of the first fenced code block when one exists (the
/// language tag on the opening fence is skipped), otherwise the trimmed
/// text. An unterminated fence yields everything after it.
pub fn extract_structured_block(raw: &str) -> Option<&str> {
    const FENCE: &str = "```";

    let block = match raw.find(FENCE) {
        Some(open) => {
            let after_fence = &raw[open + FENCE.len()..];
            let body = match after_fence.find('\n') {
                Some(nl) if is_language_tag(&after_fence[..nl]) => &after_fence[nl + 1..],
                _ => after_fence,
            };
            match body.find(FENCE) {
                Some(close) => &body[..close],
                None => body,
            }
        }
        None => raw,
    };

    let block = block.trim();
    (!block.is_empty()).then_some(block)
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}
