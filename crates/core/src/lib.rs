//! Core types and shared functionality for hvsum.
//!
//! This crate provides:
//! - The session-aware content store and request fingerprinting
//! - The concurrent search orchestrator and the search provider capability
//! - Interactive session persistence
//! - Unified error types and layered configuration

mod atomic;
pub mod cache;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod prompt;
pub mod search;
pub mod session;

pub use cache::{CacheKey, ContentStore, FileStore, MemoryStore, NullStore, Payload, fingerprint, memoize};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use search::{MultiProvider, SearchBatch, SearchOrchestrator, SearchProvider, SearchResult, format_search_results};
pub use session::{SessionData, SessionRegistry, SessionSeed};
