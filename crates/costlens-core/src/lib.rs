//! # costlens-core
//!
//! Shared infrastructure for the costlens cost analytics tool.
//!
//! This crate provides:
//! - [`CoreError`] - Error types for configuration and filesystem operations
//! - [`config`] - Settings loaded from `~/.costlens/config.yaml` with defaults
//! - [`logging`] - File and console tracing setup
//!
//! ## Example
//!
//! ```no_run
//! use costlens_core::{Config, logging};
//!
//! fn main() -> costlens_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     // Settings fall back to defaults when no file exists
//!     let config = Config::load()?;
//!     println!("database at {}", config.db_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

// Re-export main types for convenience
pub use config::{Config, GenerationConfig};
pub use error::{CoreError, Result};
pub use logging::{LogGuard, init_logging};
