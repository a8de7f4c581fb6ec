//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use rcgen::generate_simple_self_signed;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::task::JoinHandle;
use tonic::transport::{Channel, Endpoint, Uri};

use portmux::config::MuxConfig;
use portmux::http::{Server, ServerError};
use portmux::net::tls::ensure_crypto_provider;

/// Self-signed certificate material for a localhost listener.
pub struct TestCert {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Generate a throwaway certificate with localhost and 127.0.0.1 SANs.
pub fn self_signed_localhost() -> TestCert {
    let certified =
        generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .expect("generate self-signed certificate");

    TestCert {
        cert_pem: certified.cert.pem().into_bytes(),
        key_pem: certified.key_pair.serialize_pem().into_bytes(),
    }
}

/// Default config bound to a fixed loopback port.
pub fn test_config(port: u16) -> MuxConfig {
    let mut config = MuxConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{port}");
    config
}

/// Start a cleartext server on a background task.
pub fn start_plain(port: u16) -> (Arc<Server>, JoinHandle<Result<(), ServerError>>) {
    let server = Arc::new(Server::new(&test_config(port)).expect("server"));
    let task = {
        let server = server.clone();
        tokio::spawn(async move { server.serve().await })
    };
    (server, task)
}

/// Start a TLS server on a background task.
pub fn start_tls(port: u16, cert: &TestCert) -> (Arc<Server>, JoinHandle<Result<(), ServerError>>) {
    let server = Arc::new(Server::new(&test_config(port)).expect("server"));
    let task = {
        let server = server.clone();
        let cert_pem = cert.cert_pem.clone();
        let key_pem = cert.key_pem.clone();
        tokio::spawn(async move { server.serve_secure(&cert_pem, &key_pem).await })
    };
    (server, task)
}

/// HTTPS client trusting exactly the given certificate.
pub fn https_client(trust_pem: &[u8]) -> reqwest::Client {
    reqwest::Client::builder()
        .use_rustls_tls()
        .add_root_certificate(reqwest::Certificate::from_pem(trust_pem).expect("trust anchor"))
        .build()
        .expect("https client")
}

/// Like [`https_client`] but pinned to HTTP/1.1, so ALPN never offers h2.
pub fn https_client_http1(trust_pem: &[u8]) -> reqwest::Client {
    reqwest::Client::builder()
        .use_rustls_tls()
        .add_root_certificate(reqwest::Certificate::from_pem(trust_pem).expect("trust anchor"))
        .http1_only()
        .build()
        .expect("https client")
}

/// Certificate verifier that accepts anything. Test-only.
#[derive(Debug)]
struct AcceptAnyServerCert(CryptoProvider);

impl ServerCertVerifier for AcceptAnyServerCert {
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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Open a gRPC channel over TLS with certificate verification disabled.
pub async fn insecure_tls_channel(addr: SocketAddr) -> Channel {
    ensure_crypto_provider();

    let mut config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(
            rustls::crypto::ring::default_provider(),
        )))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];
    let connector = tokio_rustls::TlsConnector::from(Arc::new(config));

    // The endpoint stays plain http: the connector below owns the TLS
    // handshake, and tonic rejects an https URI on an endpoint without its
    // own TLS config.
    Endpoint::from_shared(format!("http://{addr}"))
        .expect("endpoint uri")
        .connect_with_connector(tower::service_fn(move |uri: Uri| {
            let connector = connector.clone();
            async move {
                let authority = uri.authority().expect("uri authority").clone();
                let host = authority.host().to_string();
                let port = authority.port_u16().unwrap_or(443);

                let stream = tokio::net::TcpStream::connect((host.as_str(), port)).await?;
                let domain = ServerName::try_from(host)?;
                let tls = connector.connect(domain, stream).await?;

                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(hyper_util::rt::TokioIo::new(
                    tls,
                ))
            }
        }))
        .await
        .expect("insecure tls channel")
}
