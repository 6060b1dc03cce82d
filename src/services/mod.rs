//! Services
//!
//! Business logic between the commands and the model boundary.

pub mod briefing;
pub mod busy;
pub mod imagery;
pub mod intel;
pub mod normalizer;
pub mod prompts;
pub mod store;
pub mod sync;

pub use briefing::{AudioSink, BriefingService, BriefingStats, BriefingToggle, PcmFileSink};
pub use busy::{BusyFlag, BusyGuard};
pub use intel::IntelService;
pub use store::IncidentStore;
pub use sync::{SyncCoordinator, SyncOutcome};
