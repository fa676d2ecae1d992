//! Main configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default listen address when none is configured.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Default secret marker replaced in access-log output.
pub const DEFAULT_REDACTION_MARKER: &str = "SECRET";

fn default_listen() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_marker() -> String {
    DEFAULT_REDACTION_MARKER.to_string()
}

fn default_drain_deadline() -> Option<u64> {
    Some(30)
}

/// Resolved TLS material paths.
///
/// Only produced when *both* the certificate and key are configured;
/// a partially specified pair is a configuration error, never a silent
/// downgrade to plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Path to the PEM certificate chain.
    pub cert: PathBuf,
    /// Path to the PEM private key.
    pub key: PathBuf,
}

/// Complete Talos service configuration.
///
/// Immutable once loaded: the lifecycle controller reads it during startup
/// and nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TalosConfig {
    /// Listen address, `host:port`.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Optional TLS certificate path. Must be paired with `key`.
    #[serde(default)]
    pub cert: Option<PathBuf>,

    /// Optional TLS private key path. Must be paired with `cert`.
    #[serde(default)]
    pub key: Option<PathBuf>,

    /// Debug log verbosity toggle.
    #[serde(default)]
    pub debug: bool,

    /// Seconds to wait for in-flight requests during shutdown.
    /// `null` means drain without a deadline.
    #[serde(default = "default_drain_deadline")]
    pub drain_deadline_secs: Option<u64>,

    /// Substring replaced with a redaction token in access-log output.
    #[serde(default = "default_marker")]
    pub redaction_marker: String,

    /// Whether to mount the unauthenticated `/debug/vars` endpoint.
    #[serde(default)]
    pub debug_endpoints: bool,
}

impl Default for TalosConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cert: None,
            key: None,
            debug: false,
            drain_deadline_secs: default_drain_deadline(),
            redaction_marker: default_marker(),
            debug_endpoints: false,
        }
    }
}

impl TalosConfig {
    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|e| {
            ConfigError::invalid_value("listen", format!("invalid socket address '{}': {e}", self.listen))
        })
    }

    /// Resolves the TLS settings, enforcing the both-or-neither rule.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when exactly one of `cert` and
    /// `key` is set.
    pub fn tls_settings(&self) -> Result<Option<TlsSettings>, ConfigError> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => Ok(Some(TlsSettings {
                cert: cert.clone(),
                key: key.clone(),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::invalid_value(
                "key",
                "cert is set but key is missing; TLS requires both",
            )),
            (None, Some(_)) => Err(ConfigError::invalid_value(
                "cert",
                "key is set but cert is missing; TLS requires both",
            )),
        }
    }

    /// Returns the drain deadline as a [`Duration`], if bounded.
    #[must_use]
    pub fn drain_deadline(&self) -> Option<Duration> {
        self.drain_deadline_secs.map(Duration::from_secs)
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` encountered: a malformed listen
    /// address, a half-specified TLS pair, or an empty redaction marker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.tls_settings()?;

        if self.redaction_marker.is_empty() {
            return Err(ConfigError::invalid_value(
                "redaction_marker",
                "must not be empty",
            ));
        }

        Ok(())
    }
}
