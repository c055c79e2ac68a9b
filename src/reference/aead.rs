//! AES-GCM, wired through `aes-gcm`'s `aead::Aead` trait. The only two key
//! sizes the four cipher suites in `suite.rs` ever ask for are AES-128-GCM
//! and AES-256-GCM.

use aes_gcm::aead::{Aead as AesGcmAead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm as RcAes128Gcm, Aes256Gcm as RcAes256Gcm, Nonce};

use crate::error::{Result, TlsError};
use crate::suite::Aead;

pub struct Aes128Gcm;
pub struct Aes256Gcm;

impl Aead for Aes128Gcm {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let cipher = RcAes128Gcm::new_from_slice(key).expect("AES-128 key length");
        cipher
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .expect("AES-GCM seal cannot fail for valid inputs")
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = RcAes128Gcm::new_from_slice(key).expect("AES-128 key length");
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| TlsError::BadRecordMAC)
    }
}

impl Aead for Aes256Gcm {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let cipher = RcAes256Gcm::new_from_slice(key).expect("AES-256 key length");
        cipher
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .expect("AES-GCM seal cannot fail for valid inputs")
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let cipher = RcAes256Gcm::new_from_slice(key).expect("AES-256 key length");
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| TlsError::BadRecordMAC)
    }
}
