//! Commands
//!
//! Entry points the dashboard (or the CLI) calls. Each returns a
//! `CommandResponse` envelope; failures are reported in the envelope, with
//! rate-limit exhaustion flagged as `throttled`.

pub mod briefing;
pub mod dashboard;
pub mod logistics;
pub mod prevention;
pub mod satellite;
pub mod social;

pub use briefing::*;
pub use dashboard::*;
pub use logistics::*;
pub use prevention::*;
pub use satellite::*;
pub use social::*;
