#![forbid(unsafe_code)]

//! Core domain model and business logic for the WaterCheck hydration tracker.
//!
//! This crate provides:
//! - Domain types (entries, daily records, statistics, achievements)
//! - The hydration store (mutations, day rollover, observers)
//! - Persistence (JSON state file, in-memory backend)
//! - History views, streaks and CSV export

pub mod types;
pub mod error;
pub mod clock;
pub mod config;
pub mod logging;
pub mod persist;
pub mod history;
pub mod achievements;
pub mod export;
pub mod recommend;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use persist::{JsonFileBackend, MemoryBackend, PersistedState, StateBackend};
pub use store::{HydrationStore, StoreOptions, Subscription};
