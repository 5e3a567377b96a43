//! Live model metrics.
//!
//! Polls the model performance endpoint and keeps four metric cards
//! (accuracy, training samples, fuel savings, prediction time) up to date:
//! - [`StatusSource`] fetches reports, [`HttpStatusSource`] over HTTP
//! - [`DisplayBoard`] is where the formatted values go
//! - [`MetricsPoller`] ties them together on a fixed schedule

pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod format;
pub mod poller;
pub mod source;
pub mod status;

pub use config::PollerConfig;
pub use display::{DisplayBoard, DisplayTarget, MemoryBoard};
pub use error::{Error, Result};
pub use events::{PollEvent, PollEventBroadcaster};
pub use poller::{MetricsPoller, PollerHandle, PollerStats, TickOutcome};
pub use source::{HttpStatusSource, StaticResponse, StaticSource, StatusSource};
pub use status::{ModelStatus, PerformanceReport};
