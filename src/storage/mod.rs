//! Storage Layer
//!
//! Configuration file persistence. Incident data is never persisted.

pub mod config;

pub use config::ConfigService;
