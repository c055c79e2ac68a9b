//! Client and server configuration surfaces: offered/accepted cipher
//! suites, groups, and signature algorithms (order expresses preference),
//! plus the client's SNI/auth callback and the server's credential.

use std::sync::Arc;

use crate::suite::{CipherSuite, CryptoProvider, NamedGroup, Signer, SignatureAndHash};

/// Invoked with the verified certificate chain (DER-encoded, leaf first)
/// once the client has checked the server's CertificateVerify signature.
/// Returning `Err` aborts the handshake with `BadCertificate`; chain
/// validity (expiration, trust path) is the callback's responsibility --
/// this crate does not evaluate PKI trust itself.
pub type AuthCallback = Arc<dyn Fn(&[Vec<u8>]) -> crate::error::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct ClientConfig {
    pub provider: Arc<dyn CryptoProvider>,
    pub server_name: String,
    pub supported_cipher_suites: Vec<CipherSuite>,
    pub supported_groups: Vec<NamedGroup>,
    pub supported_signature_algorithms: Vec<SignatureAndHash>,
    pub auth_callback: Option<AuthCallback>,
}

impl ClientConfig {
    /// A preference-ordered default: all four recognised suites, all three
    /// named groups, and hash/signature pairs covering both RSA and ECDSA,
    /// mirroring `ClientOptions::recommended()`.
    pub fn recommended(provider: Arc<dyn CryptoProvider>, server_name: impl Into<String>) -> Self {
        use crate::suite::{HashAlgorithm, SignatureAlgorithm};

        ClientConfig {
            provider,
            server_name: server_name.into(),
            supported_cipher_suites: CipherSuite::ALL.to_vec(),
            supported_groups: vec![NamedGroup::P256, NamedGroup::P384, NamedGroup::P521],
            supported_signature_algorithms: vec![
                SignatureAndHash::new(HashAlgorithm::sha256, SignatureAlgorithm::ecdsa),
                SignatureAndHash::new(HashAlgorithm::sha384, SignatureAlgorithm::ecdsa),
                SignatureAndHash::new(HashAlgorithm::sha256, SignatureAlgorithm::rsa),
                SignatureAndHash::new(HashAlgorithm::sha384, SignatureAlgorithm::rsa),
            ],
            auth_callback: None,
        }
    }
}

#[derive(Clone)]
pub struct ServerConfig {
    pub provider: Arc<dyn CryptoProvider>,
    pub supported_cipher_suites: Vec<CipherSuite>,
    pub supported_groups: Vec<NamedGroup>,
    /// DER-encoded certificate chain, leaf first.
    pub certificate_chain: Vec<Vec<u8>>,
    pub private_key: Arc<dyn Signer>,
    pub signature_and_hash: SignatureAndHash,
}

impl ServerConfig {
    pub fn new(
        provider: Arc<dyn CryptoProvider>,
        certificate_chain: Vec<Vec<u8>>,
        private_key: Arc<dyn Signer>,
        signature_and_hash: SignatureAndHash,
    ) -> Self {
        ServerConfig {
            provider,
            supported_cipher_suites: CipherSuite::ALL.to_vec(),
            supported_groups: vec![NamedGroup::P256, NamedGroup::P384, NamedGroup::P521],
            certificate_chain,
            private_key,
            signature_and_hash,
        }
    }
}
