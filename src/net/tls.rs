//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Error type for TLS setup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate file not found: {0:?}")]
    CertificateNotFound(PathBuf),
    #[error("private key file not found: {0:?}")]
    KeyNotFound(PathBuf),
    #[error("loading certificate/key failed: {0}")]
    Load(#[from] std::io::Error),
}

/// Select the process-wide rustls crypto provider.
///
/// Both the server side and the upstream client link rustls; with more than
/// one provider compiled in, rustls needs to be told which one to use.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
    }

    install_crypto_provider();
    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}
