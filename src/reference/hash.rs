//! Transcript hashing and HKDF, over `sha2`'s `Sha256`/`Sha384` and `hkdf`.

use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha384};

use crate::suite::TranscriptHasher;

/// Wraps a `Digest` implementation so a hash snapshot can be taken without
/// disturbing later updates, by cloning the running digest state before
/// finalizing the clone (see DESIGN.md Open Question 4).
#[derive(Clone)]
pub struct DigestHasher<D: Digest + Clone + Send + 'static>(D);

impl<D: Digest + Clone + Send + 'static> DigestHasher<D> {
    fn new() -> Self {
        DigestHasher(D::new())
    }
}

impl<D: Digest + Clone + Send + 'static> TranscriptHasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn snapshot(&self) -> Vec<u8> {
        self.0.clone().finalize().to_vec()
    }

    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn box_clone(&self) -> Box<dyn TranscriptHasher> {
        Box::new(self.clone())
    }
}

pub type Sha256Hasher = DigestHasher<Sha256>;
pub type Sha384Hasher = DigestHasher<Sha384>;

impl Sha256Hasher {
    pub fn new() -> Self {
        DigestHasher::new()
    }
}

impl Sha384Hasher {
    pub fn new() -> Self {
        DigestHasher::new()
    }
}

pub fn hkdf_extract_sha256(salt: &[u8], ikm: &[u8]) -> Vec<u8> {
    let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), ikm);
    prk.to_vec()
}

pub fn hkdf_extract_sha384(salt: &[u8], ikm: &[u8]) -> Vec<u8> {
    let (prk, _) = Hkdf::<Sha384>::extract(Some(salt), ikm);
    prk.to_vec()
}

pub fn hkdf_expand_sha256(prk: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let hk = Hkdf::<Sha256>::from_prk(prk).expect("PRK length matches SHA-256 output");
    let mut out = vec![0u8; len];
    hk.expand(info, &mut out).expect("HKDF-Expand length within 255*HashLen");
    out
}

pub fn hkdf_expand_sha384(prk: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let hk = Hkdf::<Sha384>::from_prk(prk).expect("PRK length matches SHA-384 output");
    let mut out = vec![0u8; len];
    hk.expand(info, &mut out).expect("HKDF-Expand length within 255*HashLen");
    out
}
