//! nilnop core - configuration, target resolution, and orchestration

pub mod config;
pub mod orchestrator;
pub mod targets;
