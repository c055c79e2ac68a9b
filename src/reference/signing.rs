//! Certificate signing and verification: ECDSA over P-256/P-384 (`p256`,
//! `p384`, `ecdsa`) and RSA PKCS#1 v1.5 (`rsa`), both operating on an
//! already-computed transcript-hash digest via the `ecdsa`/`rsa` crates'
//! prehash-signing APIs, never re-hashing the message themselves.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::Pkcs1v15Sign;

use crate::error::{Result, TlsError};
use crate::suite::{HashAlgorithm, Signer, SignatureAlgorithm, SignatureAndHash};

/// An ECDSA signing key over either P-256 or P-384, matched to the group of
/// the certificate it authenticates.
pub enum EcdsaSigner {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

impl EcdsaSigner {
    pub fn generate_p256() -> Self {
        EcdsaSigner::P256(p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng))
    }

    pub fn generate_p384() -> Self {
        EcdsaSigner::P384(p384::ecdsa::SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// The SEC1-encoded uncompressed public key, usable directly as a
    /// "certificate" by this reference suite (see `mod.rs`).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        use p256::elliptic_curve::sec1::ToEncodedPoint;
        match self {
            EcdsaSigner::P256(key) => key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
            EcdsaSigner::P384(key) => key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
        }
    }
}

impl Signer for EcdsaSigner {
    fn sign(&self, sig_and_hash: SignatureAndHash, message: &[u8]) -> Result<Vec<u8>> {
        if sig_and_hash.signature != SignatureAlgorithm::ecdsa {
            return Err(TlsError::InternalError(
                "EcdsaSigner asked to produce a non-ECDSA signature".into(),
            ));
        }
        match self {
            EcdsaSigner::P256(key) => {
                let sig: p256::ecdsa::Signature = key
                    .sign_prehash(message)
                    .map_err(|_| TlsError::InternalError("ECDSA signing failed".into()))?;
                Ok(sig.to_bytes().to_vec())
            }
            EcdsaSigner::P384(key) => {
                let sig: p384::ecdsa::Signature = key
                    .sign_prehash(message)
                    .map_err(|_| TlsError::InternalError("ECDSA signing failed".into()))?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }
}

/// An RSA signing key, always used with PKCS#1 v1.5 padding (the suite
/// naming in `suite.rs` carries no independent RSA padding negotiation).
pub struct RsaSigner(pub rsa::RsaPrivateKey);

impl RsaSigner {
    pub fn public_key_der(&self) -> Vec<u8> {
        use rsa::pkcs1::EncodeRsaPublicKey;
        use rsa::traits::PublicKeyParts;
        self.0
            .to_public_key()
            .to_pkcs1_der()
            .expect("RSA public key encodes to PKCS#1 DER")
            .as_bytes()
            .to_vec()
    }
}

impl Signer for RsaSigner {
    fn sign(&self, sig_and_hash: SignatureAndHash, message: &[u8]) -> Result<Vec<u8>> {
        if sig_and_hash.signature != SignatureAlgorithm::rsa {
            return Err(TlsError::InternalError(
                "RsaSigner asked to produce a non-RSA signature".into(),
            ));
        }
        let padding = pkcs1v15_padding(sig_and_hash.hash)?;
        self.0
            .sign(padding, message)
            .map_err(|_| TlsError::InternalError("RSA signing failed".into()))
    }
}

fn pkcs1v15_padding(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    Ok(match hash {
        HashAlgorithm::sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        other => {
            return Err(TlsError::InternalError(format!(
                "unsupported RSA signature hash {:?}",
                other
            )))
        }
    })
}

/// Verifies a `CertificateVerify` signature. `public_key` is this
/// reference suite's bare encoding (SEC1 point for ECDSA, PKCS#1 DER for
/// RSA) -- see `mod.rs`'s `certificate_public_key`.
pub fn verify(
    sig_and_hash: SignatureAndHash,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), ()> {
    match sig_and_hash.signature {
        SignatureAlgorithm::ecdsa => match sig_and_hash.hash {
            HashAlgorithm::sha256 => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|_| ())?;
                let sig = p256::ecdsa::Signature::from_slice(signature).map_err(|_| ())?;
                key.verify_prehash(message, &sig).map_err(|_| ())
            }
            HashAlgorithm::sha384 => {
                let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(public_key).map_err(|_| ())?;
                let sig = p384::ecdsa::Signature::from_slice(signature).map_err(|_| ())?;
                key.verify_prehash(message, &sig).map_err(|_| ())
            }
            _ => Err(()),
        },
        SignatureAlgorithm::rsa => {
            let key = rsa::RsaPublicKey::from_pkcs1_der(public_key).map_err(|_| ())?;
            let padding = pkcs1v15_padding(sig_and_hash.hash).map_err(|_| ())?;
            key.verify(padding, message, signature).map_err(|_| ())
        }
        _ => Err(()),
    }
}
