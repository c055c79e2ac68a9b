//! The handshake transcript: an ordered record of every handshake message's
//! raw serialised bytes, hashed incrementally. Keeps a live hasher and
//! snapshots it for each hash needed rather than re-hashing everything
//! accumulated so far on every call -- see DESIGN.md Open Question 4.

use crate::suite::{CipherSuite, CryptoProvider, TranscriptHasher};

pub struct Transcript {
    hasher: Box<dyn TranscriptHasher>,
}

impl Transcript {
    pub fn new(provider: &dyn CryptoProvider, suite: CipherSuite) -> Self {
        Transcript {
            hasher: provider.transcript_hasher(suite),
        }
    }

    /// Absorbs one handshake message's raw, already-serialised bytes. Must
    /// never be called with a re-serialised parsed body: canonicalisation of
    /// an arbitrary peer encoding is not guaranteed.
    pub fn push(&mut self, raw_message: &[u8]) {
        self.hasher.update(raw_message);
    }

    /// The hash of every message absorbed so far, without disturbing future
    /// updates.
    pub fn hash(&self) -> Vec<u8> {
        self.hasher.snapshot()
    }
}
