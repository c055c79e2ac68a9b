//! Cipher suites, named groups, signature/hash pairs, and the abstract
//! crypto seam the handshake and record layers are built against.
//!
//! Raw primitives (AEAD, HKDF, ECDH, signatures) and PKI trust evaluation
//! are explicitly out of scope for the core: this module only defines the
//! trait-object interface a caller plugs a concrete implementation into.
//! `src/reference` supplies one, built from real RustCrypto crates, for
//! tests.

use crate::error::{Result, TlsError};
use crate::parsing::Cursor;
use crate::tls_enum_u8;

tls_enum_u8!(SignatureAlgorithm =>
    rsa(1),
    ecdsa(3)
);

tls_enum_u8!(HashAlgorithm =>
    sha256(4),
    sha384(5),
    sha512(6)
);

/// A (hash, signature) pair, as carried in the `signature_algorithms`
/// extension and in `CertificateVerify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureAndHash {
    pub hash: HashAlgorithm,
    pub signature: SignatureAlgorithm,
}

impl SignatureAndHash {
    pub fn new(hash: HashAlgorithm, signature: SignatureAlgorithm) -> Self {
        SignatureAndHash { hash, signature }
    }

    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        // Wire order per TLS 1.2/1.3 drafts: hash octet, then signature octet.
        let hash = HashAlgorithm::parse(cursor)?;
        let signature = SignatureAlgorithm::parse(cursor)?;
        Ok(SignatureAndHash { hash, signature })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        self.hash.serialize(out);
        self.signature.serialize(out);
    }
}

/// The four cipher suite identifiers this implementation recognises.
///
/// These names read like TLS 1.2 ECDHE suite names (signature algorithm
/// baked into the suite) rather than TLS 1.3's signature-agnostic
/// `TLS_AES_128_GCM_SHA256` style. We bind each identifier to only
/// {AEAD, key length, hash} here; the ECDSA/RSA token is informational and
/// does not gate anything -- the actual CertificateVerify signature
/// algorithm is negotiated independently via `SignatureAndHash` (see
/// DESIGN.md, Open Question 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    EcdheEcdsaAes128GcmSha256,
    EcdheRsaAes128GcmSha256,
    EcdheEcdsaAes256GcmSha384,
    EcdheRsaAes256GcmSha384,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 4] = [
        CipherSuite::EcdheEcdsaAes128GcmSha256,
        CipherSuite::EcdheRsaAes128GcmSha256,
        CipherSuite::EcdheEcdsaAes256GcmSha384,
        CipherSuite::EcdheRsaAes256GcmSha384,
    ];

    pub fn to_u16(&self) -> u16 {
        match self {
            CipherSuite::EcdheEcdsaAes128GcmSha256 => 0xc02b,
            CipherSuite::EcdheRsaAes128GcmSha256 => 0xc02f,
            CipherSuite::EcdheEcdsaAes256GcmSha384 => 0xc02c,
            CipherSuite::EcdheRsaAes256GcmSha384 => 0xc030,
        }
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        Some(match v {
            0xc02b => CipherSuite::EcdheEcdsaAes128GcmSha256,
            0xc02f => CipherSuite::EcdheRsaAes128GcmSha256,
            0xc02c => CipherSuite::EcdheEcdsaAes256GcmSha384,
            0xc030 => CipherSuite::EcdheRsaAes256GcmSha384,
            _ => return None,
        })
    }

    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let v = cursor.read_u16()?;
        Self::from_u16(v).ok_or_else(|| TlsError::DecodeError(format!("unknown cipher suite {:#x}", v)))
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_u16().to_be_bytes());
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            CipherSuite::EcdheEcdsaAes128GcmSha256 | CipherSuite::EcdheRsaAes128GcmSha256 => {
                HashAlgorithm::sha256
            }
            CipherSuite::EcdheEcdsaAes256GcmSha384 | CipherSuite::EcdheRsaAes256GcmSha384 => {
                HashAlgorithm::sha384
            }
        }
    }

    pub fn hash_len(&self) -> usize {
        match self.hash() {
            HashAlgorithm::sha256 => 32,
            HashAlgorithm::sha384 => 48,
            _ => 0,
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            CipherSuite::EcdheEcdsaAes128GcmSha256 | CipherSuite::EcdheRsaAes128GcmSha256 => 16,
            CipherSuite::EcdheEcdsaAes256GcmSha384 | CipherSuite::EcdheRsaAes256GcmSha384 => 32,
        }
    }

    pub const IV_LEN: usize = 12;
}

/// Named elliptic curve groups this implementation recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedGroup {
    P256,
    P384,
    P521,
}

impl NamedGroup {
    pub fn to_u16(&self) -> u16 {
        match self {
            NamedGroup::P256 => 23,
            NamedGroup::P384 => 24,
            NamedGroup::P521 => 25,
        }
    }

    pub fn from_u16(v: u16) -> Option<Self> {
        Some(match v {
            23 => NamedGroup::P256,
            24 => NamedGroup::P384,
            25 => NamedGroup::P521,
            _ => return None,
        })
    }

    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let v = cursor.read_u16()?;
        Self::from_u16(v).ok_or_else(|| TlsError::DecodeError(format!("unknown named group {}", v)))
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_u16().to_be_bytes());
    }
}

/// A symmetric AEAD keyed for one direction, abstracted away from any
/// concrete algorithm. `key.len()` is always `CipherSuite::key_len()` and
/// `nonce.len()` is always `CipherSuite::IV_LEN`.
pub trait Aead: Send + Sync {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Vec<u8>;
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// An in-progress transcript/running hash, cloneable so a snapshot digest
/// can be taken without disturbing later updates (see DESIGN.md Open
/// Question 4).
pub trait TranscriptHasher: Send {
    fn update(&mut self, data: &[u8]);
    fn snapshot(&self) -> Vec<u8>;
    fn output_len(&self) -> usize;
    fn box_clone(&self) -> Box<dyn TranscriptHasher>;
}

/// One side of an ephemeral ECDH exchange. Consumed by `agree` so a stale
/// private key cannot be reused.
pub trait EphemeralKeyExchange: Send {
    fn public_bytes(&self) -> Vec<u8>;
    fn agree(self: Box<Self>, peer_public: &[u8]) -> Result<Vec<u8>>;
}

/// A private key capable of signing handshake transcripts for
/// `CertificateVerify`, parameterised by the negotiated `SignatureAndHash`.
pub trait Signer: Send + Sync {
    fn sign(&self, sig_and_hash: SignatureAndHash, message: &[u8]) -> Result<Vec<u8>>;
}

/// The abstract crypto provider the handshake and record layers are built
/// against. A production embedder plugs in a real implementation; this
/// crate ships only a test-only `reference` one (feature `reference-suite`).
pub trait CryptoProvider: Send + Sync {
    fn aead(&self, suite: CipherSuite) -> Box<dyn Aead>;

    fn transcript_hasher(&self, suite: CipherSuite) -> Box<dyn TranscriptHasher>;

    fn hkdf_extract(&self, suite: CipherSuite, salt: &[u8], ikm: &[u8]) -> Vec<u8>;

    fn hkdf_expand(&self, suite: CipherSuite, prk: &[u8], info: &[u8], len: usize) -> Vec<u8>;

    fn generate_key_share(&self, group: NamedGroup) -> Box<dyn EphemeralKeyExchange>;

    /// Extracts the DER-encoded SubjectPublicKeyInfo from a leaf certificate's
    /// DER bytes. Certificate chain construction and PKI trust evaluation stay
    /// out of scope; this is the one piece of X.509 parsing the
    /// core itself needs, so it lives behind the same abstract seam as every
    /// other primitive rather than growing an ASN.1 dependency of its own.
    fn certificate_public_key(&self, certificate_der: &[u8]) -> Result<Vec<u8>>;

    /// Verifies `signature` over `message` using the DER-encoded SubjectPublicKeyInfo
    /// bytes extracted from a certificate's public key.
    fn verify_signature(
        &self,
        sig_and_hash: SignatureAndHash,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()>;
}
