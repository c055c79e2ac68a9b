//! The TLS 1.3 key schedule: HKDF-Expand-Label, Derive-Secret, and the
//! handshake/master/application secret derivations that feed the record
//! layer's traffic keys.
//!
//! This design is pure 1-RTT with the early secret and static secret equal
//! to the ephemeral one (xSS = xES), but still follows RFC 8446's two-stage
//! HKDF-Extract dance (early secret -> handshake secret -> master secret);
//! see DESIGN.md Open Question 3 for the Finished verify-data derivation.

use crate::suite::{CipherSuite, CryptoProvider};

fn hkdf_expand_label(
    provider: &dyn CryptoProvider,
    suite: CipherSuite,
    secret: &[u8],
    label: &str,
    context: &[u8],
    length: usize,
) -> Vec<u8> {
    // HkdfLabel per RFC 8446 §7.1: length(u16) ++ label<7..255> ++ context<0..255>,
    // where label is "tls13 " prefixed onto the caller's short name.
    let mut full_label = Vec::with_capacity(6 + label.len());
    full_label.extend_from_slice(b"tls13 ");
    full_label.extend_from_slice(label.as_bytes());

    let mut info = Vec::with_capacity(2 + 1 + full_label.len() + 1 + context.len());
    info.extend_from_slice(&(length as u16).to_be_bytes());
    info.push(full_label.len() as u8);
    info.extend_from_slice(&full_label);
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    provider.hkdf_expand(suite, secret, &info, length)
}

fn derive_secret(
    provider: &dyn CryptoProvider,
    suite: CipherSuite,
    secret: &[u8],
    label: &str,
    transcript_hash: &[u8],
) -> Vec<u8> {
    hkdf_expand_label(provider, suite, secret, label, transcript_hash, suite.hash_len())
}

/// A derived AEAD key and IV for one direction.
#[derive(Clone)]
pub struct TrafficKeyIv {
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
}

fn traffic_key_iv(provider: &dyn CryptoProvider, suite: CipherSuite, secret: &[u8]) -> TrafficKeyIv {
    TrafficKeyIv {
        key: hkdf_expand_label(provider, suite, secret, "key", &[], suite.key_len()),
        iv: hkdf_expand_label(provider, suite, secret, "iv", &[], CipherSuite::IV_LEN),
    }
}

/// The traffic secrets and derived keys produced once the shared secret and
/// the ClientHello/ServerHello transcript hash are known.
pub struct HandshakeKeys {
    pub client_handshake_traffic_secret: Vec<u8>,
    pub server_handshake_traffic_secret: Vec<u8>,
    pub client_write: TrafficKeyIv,
    pub server_write: TrafficKeyIv,
}

/// Application traffic keys, derived once the full handshake transcript
/// (through the peer's Finished) is known.
pub struct ApplicationKeys {
    pub client_write: TrafficKeyIv,
    pub server_write: TrafficKeyIv,
}

/// Holds the master secret across the handshake so application keys can be
/// derived from it later, once the transcript is complete.
pub struct KeySchedule {
    suite: CipherSuite,
    master_secret: Vec<u8>,
}

impl KeySchedule {
    /// `shared_secret` is the ECDH output; `ch_sh_transcript_hash` is the
    /// transcript hash over ClientHello..ServerHello inclusive.
    pub fn new(
        provider: &dyn CryptoProvider,
        suite: CipherSuite,
        shared_secret: &[u8],
        ch_sh_transcript_hash: &[u8],
    ) -> (Self, HandshakeKeys) {
        let hash_len = suite.hash_len();
        let zero = vec![0u8; hash_len];

        // Empty-input hash, needed by Derive-Secret("derived", ...) per RFC 8446.
        let empty_hash = provider.transcript_hasher(suite).snapshot();

        let early_secret = provider.hkdf_extract(suite, &zero, &zero);
        let derived_early = derive_secret(provider, suite, &early_secret, "derived", &empty_hash);
        let handshake_secret = provider.hkdf_extract(suite, &derived_early, shared_secret);

        let client_hs = derive_secret(
            provider,
            suite,
            &handshake_secret,
            "c hs traffic",
            ch_sh_transcript_hash,
        );
        let server_hs = derive_secret(
            provider,
            suite,
            &handshake_secret,
            "s hs traffic",
            ch_sh_transcript_hash,
        );

        let derived_handshake =
            derive_secret(provider, suite, &handshake_secret, "derived", &empty_hash);
        let master_secret = provider.hkdf_extract(suite, &derived_handshake, &zero);

        let client_write = traffic_key_iv(provider, suite, &client_hs);
        let server_write = traffic_key_iv(provider, suite, &server_hs);

        (
            KeySchedule {
                suite,
                master_secret,
            },
            HandshakeKeys {
                client_handshake_traffic_secret: client_hs,
                server_handshake_traffic_secret: server_hs,
                client_write,
                server_write,
            },
        )
    }

    /// `full_transcript_hash` covers every handshake message through the
    /// peer's Finished.
    pub fn application_keys(
        &self,
        provider: &dyn CryptoProvider,
        full_transcript_hash: &[u8],
    ) -> ApplicationKeys {
        let client_ap = derive_secret(
            provider,
            self.suite,
            &self.master_secret,
            "c ap traffic",
            full_transcript_hash,
        );
        let server_ap = derive_secret(
            provider,
            self.suite,
            &self.master_secret,
            "s ap traffic",
            full_transcript_hash,
        );

        ApplicationKeys {
            client_write: traffic_key_iv(provider, self.suite, &client_ap),
            server_write: traffic_key_iv(provider, self.suite, &server_ap),
        }
    }
}

/// Computes a Finished message's verify_data from a handshake traffic
/// secret and the transcript hash up to (not including) that Finished.
///
/// `HKDF-Extract(finished_key, transcript_hash)` is the same value as
/// `HMAC(finished_key, transcript_hash)` per RFC 5869's definition of
/// Extract as HMAC(salt, IKM); we route it through the provider's
/// `hkdf_extract` so the core stays primitive-agnostic (see DESIGN.md Open
/// Question 3).
pub fn finished_verify_data(
    provider: &dyn CryptoProvider,
    suite: CipherSuite,
    base_secret: &[u8],
    transcript_hash: &[u8],
) -> Vec<u8> {
    let finished_key = hkdf_expand_label(provider, suite, base_secret, "finished", &[], suite.hash_len());
    provider.hkdf_extract(suite, &finished_key, transcript_hash)
}
