//! In-memory adapters with the same semantics as the SQLite ones.

pub mod noise_event_repository;
pub mod persona_repository;

pub use noise_event_repository::InMemoryNoiseEventRepository;
pub use persona_repository::InMemoryPersonaRepository;
