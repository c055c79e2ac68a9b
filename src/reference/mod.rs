//! A concrete `CryptoProvider` built from real RustCrypto crates, used only
//! by this crate's own tests (feature `reference-suite`).
//!
//! The core (everything outside this module) never depends on a concrete
//! AEAD/hash/ECDH/signature crate; it only depends on the trait seam in
//! `suite.rs`. This module is the one place that seam is implemented, built
//! on RustCrypto's `sha2`/`hkdf`/`aes-gcm`/`p256`/`p384`/`rsa`/`signature`
//! stack.
//!
//! `certificate_public_key` does not parse X.509: certificate chain
//! construction and PKI trust evaluation are out of scope, and fabricating
//! an ASN.1 parser just to unwrap a SubjectPublicKeyInfo would add a
//! dependency this seam doesn't otherwise need. Certificates produced by and
//! fed to this reference suite are therefore literally the bare public-key
//! encoding (SEC1 point for ECDSA, PKCS#1 DER for RSA) with no wrapper, and
//! `certificate_public_key` is an honest identity function over that
//! encoding rather than a fake parser.

mod aead;
mod hash;
mod kex;
mod signing;

use crate::error::{Result, TlsError};
use crate::suite::{
    Aead, CipherSuite, CryptoProvider, EphemeralKeyExchange, HashAlgorithm, NamedGroup,
    SignatureAndHash, TranscriptHasher,
};

/// The reference crypto provider. Stateless: every method is a pure
/// dispatch on the cipher suite's hash/AEAD choice.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceProvider;

impl CryptoProvider for ReferenceProvider {
    fn aead(&self, suite: CipherSuite) -> Box<dyn Aead> {
        match suite.key_len() {
            16 => Box::new(aead::Aes128Gcm),
            32 => Box::new(aead::Aes256Gcm),
            other => unreachable!("unsupported AEAD key length {}", other),
        }
    }

    fn transcript_hasher(&self, suite: CipherSuite) -> Box<dyn TranscriptHasher> {
        match suite.hash() {
            HashAlgorithm::sha256 => Box::new(hash::Sha256Hasher::new()),
            HashAlgorithm::sha384 => Box::new(hash::Sha384Hasher::new()),
            other => unreachable!("unsupported transcript hash {:?}", other),
        }
    }

    fn hkdf_extract(&self, suite: CipherSuite, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        match suite.hash() {
            HashAlgorithm::sha256 => hash::hkdf_extract_sha256(salt, ikm),
            HashAlgorithm::sha384 => hash::hkdf_extract_sha384(salt, ikm),
            other => unreachable!("unsupported HKDF hash {:?}", other),
        }
    }

    fn hkdf_expand(&self, suite: CipherSuite, prk: &[u8], info: &[u8], len: usize) -> Vec<u8> {
        match suite.hash() {
            HashAlgorithm::sha256 => hash::hkdf_expand_sha256(prk, info, len),
            HashAlgorithm::sha384 => hash::hkdf_expand_sha384(prk, info, len),
            other => unreachable!("unsupported HKDF hash {:?}", other),
        }
    }

    fn generate_key_share(&self, group: NamedGroup) -> Box<dyn EphemeralKeyExchange> {
        match group {
            NamedGroup::P256 => Box::new(kex::P256Kex::generate()),
            NamedGroup::P384 => Box::new(kex::P384Kex::generate()),
            NamedGroup::P521 => {
                // Not wired up: no P-521 crate is in this dependency stack,
                // and the reference suite is test-only, so tests simply
                // never offer P521.
                panic!("reference-suite: P521 is not implemented")
            }
        }
    }

    fn certificate_public_key(&self, certificate_der: &[u8]) -> Result<Vec<u8>> {
        Ok(certificate_der.to_vec())
    }

    fn verify_signature(
        &self,
        sig_and_hash: SignatureAndHash,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        signing::verify(sig_and_hash, public_key, message, signature)
            .map_err(|_| TlsError::DecryptError)
    }
}

pub use kex::{P256Kex, P384Kex};
pub use signing::{EcdsaSigner, RsaSigner};
