//! Logging and tracing
//!
//! - Structured logs through `tracing`, filtered by `EnvFilter`
//! - Human-readable or JSON output, selected by `[log] json`
//! - Span helpers for the query and HTTP request paths
//!
//! # Usage
//!
//! ```rust,ignore
//! use metrics_endpoint::config::LogConfig;
//! use metrics_endpoint::observability::init_tracing;
//!
//! init_tracing(&LogConfig::default()).expect("Failed to initialize tracing");
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `[log] level` | Filter directives, overrides the config level |

pub mod spans;
pub mod tracing_setup;

pub use spans::*;
pub use tracing_setup::init as init_tracing;
