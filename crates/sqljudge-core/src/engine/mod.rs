//! Staged checking pipeline.
//!
//! ```text
//! provider ──▶ restriction stage ──▶ selection stage ──▶ write-back
//!    ▲
//!    └── stop token (checked at every tick)
//! ```
//!
//! Each arrow is a bounded channel holding one submission, so order is kept
//! end to end and a slow stage back-pressures everything upstream. Only the
//! provider observes the stop token; the stages end when their input closes.

pub mod pipeline;
pub mod provider;
pub mod stage;

pub use pipeline::{Pipeline, RunSummary, StopHandle};
pub use provider::{spawn_provider, InFlight, TickMode};
pub use stage::{spawn_stage, STAGE_CAPACITY};
