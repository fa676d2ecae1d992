//! Profile-based configuration for Talos services.
//!
//! Configuration is loaded once at startup from a JSON or TOML file selected
//! by a *profile* name (`config/<profile>.json` by default, overridable with
//! an explicit path) and is read-only for the lifetime of the process.
//!
//! # Example
//!
//! ```no_run
//! use talos_config::TalosConfig;
//!
//! # fn main() -> Result<(), talos_config::ConfigError> {
//! let config = TalosConfig::load_profile("production", None)?;
//! println!("listening on {}", config.listen);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod loader;

pub use config::{TalosConfig, TlsSettings, DEFAULT_LISTEN_ADDR, DEFAULT_REDACTION_MARKER};
pub use error::ConfigError;
