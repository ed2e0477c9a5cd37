//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod replication;

// Re-export main functions
pub use replication::{replication_task, sync_latest};
