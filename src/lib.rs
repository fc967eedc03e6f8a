//! pagefeed - Cached Facebook Page feed
//!
//! Reads a Facebook Page's profile, posts and post engagement from the Graph
//! API and serves them from a process-local cache with per-operation TTLs and
//! tag-based invalidation.
//!
//! # Architecture
//!
//! - **graph**: Graph API client, wire schema and domain types
//! - **cache**: In-memory TTL cache, tag ledger and clocks
//! - **cursor**: Pagination cursor extraction from paging URLs
//! - **feed**: Cached accessor, initial-data aggregate, revalidation, load-more session
//! - **server**: HTTP API (axum)
//! - **config**: YAML configuration with environment overrides

// Core modules
pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod graph;

// Components
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod server;

// Re-exports
pub use error::{PageFeedError, Result};
