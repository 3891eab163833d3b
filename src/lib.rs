//! Taskloop - build-test-repeat loop tracker for agent coding workflows

pub mod commands;
pub mod config;
pub mod error;
pub mod plan;
pub mod render;
pub mod state;
pub mod store;
pub mod telemetry;
