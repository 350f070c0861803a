//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - ContentGenerator: LLM text generation
//! - NoiseEventRepository: Noise event persistence
//! - PersonaRepository: Persona persistence
//! - Clock: Wall-clock time and sleeping
//!
//! These traits let the services run against SQLite and a real LLM in
//! production, and against in-memory twins and scripted generators in tests.

pub mod clock;
pub mod content_generator;
pub mod noise_event_repository;
pub mod persona_repository;

pub use clock::Clock;
pub use content_generator::ContentGenerator;
pub use noise_event_repository::{BoundedAppend, NoiseEventRepository};
pub use persona_repository::PersonaRepository;
