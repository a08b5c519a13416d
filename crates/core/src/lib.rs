//! Core types and shared functionality for outpost.
//!
//! This crate provides:
//! - Generation-scoped response store with SQLite backend
//! - Task persistence store
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;
pub mod tasks;

pub use config::AppConfig;
pub use error::Error;
pub use store::{ResponseStore, StoredResponse};
pub use tasks::{Task, TaskStore};
