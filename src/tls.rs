//! TLS client certificate material for outbound connections.
//!
//! [`ClientTlsMaterial`] holds a PEM certificate chain and private key
//! loaded once at startup. [`ClientTlsMaterial::client_config`] and
//! [`client_config`] build the `rustls` client configuration the collector
//! uses when the target requires TLS, optionally without verifying the
//! server certificate.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::ExporterError;

pub struct ClientTlsMaterial {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl std::fmt::Debug for ClientTlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTlsMaterial")
            .field("certificates", &self.cert_chain.len())
            .field("key", &"******")
            .finish()
    }
}

impl Clone for ClientTlsMaterial {
    fn clone(&self) -> Self {
        Self {
            cert_chain: self.cert_chain.clone(),
            key: self.key.clone_key(),
        }
    }
}

impl ClientTlsMaterial {
    /// Load a key pair from PEM files and check that it can be used for
    /// client authentication.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, ExporterError> {
        let cert_chain = CertificateDer::pem_file_iter(cert_path)
            .and_then(|certs| certs.collect::<Result<Vec<_>, _>>())
            .map_err(|e| ExporterError::TlsLoad {
                path: cert_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if cert_chain.is_empty() {
            return Err(ExporterError::TlsLoad {
                path: cert_path.to_path_buf(),
                reason: "no certificates found".into(),
            });
        }

        let key = PrivateKeyDer::from_pem_file(key_path).map_err(|e| ExporterError::TlsLoad {
            path: key_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let material = Self { cert_chain, key };

        // Building a config makes the provider parse the key.
        ClientConfig::builder_with_provider(provider())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(RootCertStore::empty())
            .with_client_auth_cert(material.cert_chain.clone(), material.key.clone_key())
            .map_err(|e| ExporterError::TlsLoad {
                path: key_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(material)
    }

    #[must_use]
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    pub fn client_config(&self, skip_verification: bool) -> Result<ClientConfig, ExporterError> {
        client_config(Some(self), skip_verification)
    }
}

/// Client configuration with optional client certificate.
pub fn client_config(
    material: Option<&ClientTlsMaterial>,
    skip_verification: bool,
) -> Result<ClientConfig, ExporterError> {
    let provider = provider();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let builder = if skip_verification {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification(provider)))
    } else {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots)
    };

    let config = match material {
        Some(m) => builder.with_client_auth_cert(m.cert_chain.clone(), m.key.clone_key())?,
        None => builder.with_no_client_auth(),
    };
    Ok(config)
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Accepts any server certificate; signatures are still checked.
#[derive(Debug)]
struct NoVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn loads_fixture_pair() {
        let material =
            ClientTlsMaterial::load(&fixture("client.crt"), &fixture("client.key")).unwrap();
        assert_eq!(material.certificates().len(), 1);
    }

    #[test]
    fn missing_files_fail() {
        let err = ClientTlsMaterial::load(&fixture("missing.crt"), &fixture("client.key"))
            .unwrap_err();
        assert!(matches!(err, ExporterError::TlsLoad { .. }));

        let err = ClientTlsMaterial::load(&fixture("client.crt"), &fixture("missing.key"))
            .unwrap_err();
        assert!(matches!(err, ExporterError::TlsLoad { .. }));
    }

    #[test]
    fn swapped_paths_fail() {
        // a certificate file holds no private key and vice versa
        let err =
            ClientTlsMaterial::load(&fixture("client.key"), &fixture("client.crt")).unwrap_err();
        assert!(matches!(err, ExporterError::TlsLoad { .. }));
    }

    #[test]
    fn builds_client_configs() {
        let material =
            ClientTlsMaterial::load(&fixture("client.crt"), &fixture("client.key")).unwrap();
        assert!(material.client_config(true).is_ok());
        assert!(material.client_config(false).is_ok());
        assert!(client_config(None, false).is_ok());
    }

    #[test]
    fn debug_hides_key() {
        let material =
            ClientTlsMaterial::load(&fixture("client.crt"), &fixture("client.key")).unwrap();
        let rendered = format!("{material:?}");
        assert!(rendered.contains("******"));
        assert!(!rendered.contains("PRIVATE"));
    }
}
