//! Core services: retrying generation, the noise queue, persona rotation,
//! the active-hours gate and the scheduler that ties them together.

pub mod active_hours;
pub mod noise_queue;
pub mod noise_scheduler;
pub mod persona_rotation;
pub mod retry;

pub use active_hours::ActiveHours;
pub use noise_queue::NoiseQueue;
pub use noise_scheduler::{CycleOutcome, LoopKind, NoiseScheduler, SchedulerStatus};
pub use persona_rotation::{PersonaState, RotationPolicy};
pub use retry::{RetryPolicy, RetryingGenerator};
