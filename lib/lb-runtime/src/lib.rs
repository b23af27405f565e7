//! Kubernetes plumbing shared by the speaker and the controller
//!
//! - Kube-backed implementations of the lb-core store traits
//! - A controller driver with per-object deadlines and backoff
//! - The metrics and health endpoint
//! - Environment configuration helpers
//! - Logging setup

pub mod client;
pub mod controller;
pub mod config;
pub mod http;
pub mod logging;

pub use client::{KubeNodeStore, KubeServiceStore};
pub use controller::{run_controller, ControllerSettings};
