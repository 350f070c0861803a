//! Adapters implementing the domain ports.

pub mod clock;
pub mod generators;
pub mod memory;
pub mod sqlite;

pub use clock::{ManualClock, SystemClock};
