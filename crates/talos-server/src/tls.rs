//! TLS listener support.
//!
//! Certificates and keys are loaded once at startup from PEM files; there
//! is no runtime reload. A failure here is fatal, the server never falls
//! back to plaintext when TLS was requested.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use talos_config::TlsSettings;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;

/// Errors from TLS material loading or configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// A PEM file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The certificate file parsed but contained no certificates.
    #[error("no certificates found in {path}")]
    NoCertificates {
        /// The offending file.
        path: PathBuf,
    },

    /// The key file parsed but contained no private key.
    #[error("no private key found in {path}")]
    NoPrivateKey {
        /// The offending file.
        path: PathBuf,
    },

    /// The certificate and key did not form a usable server identity.
    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Loads the certificate chain from a PEM file.
///
/// # Errors
///
/// Returns [`TlsError::Read`] on I/O failure and
/// [`TlsError::NoCertificates`] when the file holds none.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let chain = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if chain.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(path = %path.display(), count = chain.len(), "loaded TLS certificates");
    Ok(chain)
}

/// Loads the private key from a PEM file.
///
/// Accepts PKCS#1, PKCS#8, and SEC1 encodings.
///
/// # Errors
///
/// Returns [`TlsError::Read`] on I/O failure and [`TlsError::NoPrivateKey`]
/// when no key is present.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let key = private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })?;

    tracing::info!(path = %path.display(), "loaded TLS private key");
    Ok(key)
}

/// Builds the TLS acceptor for the listener.
///
/// # Errors
///
/// Fails when either PEM file is unreadable or the pair does not form a
/// valid server identity.
pub fn build_acceptor(settings: &TlsSettings) -> Result<TlsAcceptor, TlsError> {
    let chain = load_certificates(&settings.cert)?;
    let key = load_private_key(&settings.key)?;

    let mut server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)?;
    server_config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}
