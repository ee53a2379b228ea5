/// SurfWatch - good-surf detection and push notification service
///
/// This library evaluates hourly marine forecasts for a set of surf spots
/// and notifies subscribed devices, in one batch, when any spot shows a
/// sustained daylight swell.
pub mod app;
pub mod auth;
pub mod cli;
pub mod conditions;
pub mod config;
pub mod core;
pub mod cycle;
pub mod error;
pub mod internal_metrics;
pub mod notification;
pub mod scheduler;
pub mod server;
pub mod task_manager;
pub mod weather;

// Re-export core types for convenience
pub use crate::core::*;
