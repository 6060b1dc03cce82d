//! Data Models
//!
//! Configuration and command-envelope types.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;
