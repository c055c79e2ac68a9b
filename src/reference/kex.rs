//! Ephemeral ECDH key exchange over NIST P-256/P-384, via `p256`/`p384`'s
//! `ecdh` modules.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;

use crate::error::{Result, TlsError};
use crate::suite::EphemeralKeyExchange;

pub struct P256Kex {
    secret: p256::ecdh::EphemeralSecret,
    public: p256::PublicKey,
}

impl P256Kex {
    pub fn generate() -> Self {
        let secret = p256::ecdh::EphemeralSecret::random(&mut OsRng);
        let public = p256::PublicKey::from(&secret);
        P256Kex { secret, public }
    }
}

impl EphemeralKeyExchange for P256Kex {
    fn public_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(false).as_bytes().to_vec()
    }

    fn agree(self: Box<Self>, peer_public: &[u8]) -> Result<Vec<u8>> {
        let peer = p256::PublicKey::from_sec1_bytes(peer_public)
            .map_err(|_| TlsError::DecodeError("invalid P-256 public key".into()))?;
        let shared = self.secret.diffie_hellman(&peer);
        Ok(shared.raw_secret_bytes().to_vec())
    }
}

pub struct P384Kex {
    secret: p384::ecdh::EphemeralSecret,
    public: p384::PublicKey,
}

impl P384Kex {
    pub fn generate() -> Self {
        let secret = p384::ecdh::EphemeralSecret::random(&mut OsRng);
        let public = p384::PublicKey::from(&secret);
        P384Kex { secret, public }
    }
}

impl EphemeralKeyExchange for P384Kex {
    fn public_bytes(&self) -> Vec<u8> {
        self.public.to_encoded_point(false).as_bytes().to_vec()
    }

    fn agree(self: Box<Self>, peer_public: &[u8]) -> Result<Vec<u8>> {
        let peer = p384::PublicKey::from_sec1_bytes(peer_public)
            .map_err(|_| TlsError::DecodeError("invalid P-384 public key".into()))?;
        let shared = self.secret.diffie_hellman(&peer);
        Ok(shared.raw_secret_bytes().to_vec())
    }
}
