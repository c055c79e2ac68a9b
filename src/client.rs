//! The client-side handshake driver: a single straight-line procedure run
//! under both direction locks (see `Connection::run_handshake`). 1-RTT only:
//! no session resumption, 0-RTT data, PSK, or client certificates.

use std::collections::HashMap;
use std::io::{Read, Write};

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::connection::{Connection, HandshakeSummary};
use crate::error::{Result, TlsError};
use crate::extensions::{Extension, ExtensionSet};
use crate::handshake_layer::{HandshakeReader, HandshakeWriter};
use crate::key_schedule::{self, KeySchedule};
use crate::messages::{
    Certificate, CertificateVerify, ClientHello, EncryptedExtensions, Finished, Handshake,
    HandshakeType,
};
use crate::parsing::Cursor;
use crate::record::DirectionKeys;
use crate::suite::{CryptoProvider, EphemeralKeyExchange, NamedGroup};
use crate::transport::Transport;

/// Runs the client handshake to completion on `conn`, consuming both
/// direction locks for its duration. Idempotent: a connection whose
/// handshake already completed (or already failed) returns immediately
/// (see `Connection::run_handshake`).
pub fn handshake<T: Transport>(conn: &Connection<T>, config: &ClientConfig) -> Result<()> {
    conn.run_handshake(|reader, writer| run(reader, writer, config))
}

fn run<R: Read, W: Write>(
    reader: &mut HandshakeReader<R>,
    writer: &mut HandshakeWriter<W>,
    config: &ClientConfig,
) -> Result<HandshakeSummary> {
    let provider = config.provider.as_ref();

    // 1. Generate an ephemeral keypair per supported group.
    let mut secrets: HashMap<NamedGroup, Box<dyn EphemeralKeyExchange>> = HashMap::new();
    let mut key_shares = Vec::new();
    for group in &config.supported_groups {
        let kex = provider.generate_key_share(*group);
        key_shares.push(crate::extensions::KeyShareEntry {
            group: *group,
            key_exchange: Bytes::from(kex.public_bytes()),
        });
        secrets.insert(*group, kex);
    }

    // 2. Assemble and send ClientHello.
    let mut extensions = ExtensionSet::new();
    extensions.add(Extension::ServerName(config.server_name.clone()))?;
    extensions.add(Extension::KeyShareClientHello(key_shares))?;
    extensions.add(Extension::SupportedGroups(config.supported_groups.clone()))?;
    extensions.add(Extension::SignatureAlgorithms(
        config.supported_signature_algorithms.clone(),
    ))?;
    extensions.add(Extension::DraftVersion(crate::DRAFT_VERSION))?;

    let client_hello = ClientHello {
        legacy_version: crate::record::LEGACY_RECORD_VERSION,
        random: random_32(),
        legacy_session_id: Bytes::new(),
        cipher_suites: config.supported_cipher_suites.clone(),
        legacy_compression_methods: Bytes::from_static(&[0]),
        extensions,
    };

    let ch_raw = writer.write_message(&Handshake::ClientHello(client_hello))?;

    // 3. Read ServerHello.
    let (sh_raw, msg_type, body) = reader.read_message()?;
    if msg_type != HandshakeType::server_hello {
        return Err(TlsError::UnexpectedMessage(format!(
            "expected ServerHello, got {:?}",
            msg_type
        )));
    }
    let server_hello = crate::messages::ServerHello::parse(&mut Cursor::new(body))?;

    let suite = server_hello.cipher_suite;
    if !config.supported_cipher_suites.contains(&suite) {
        return Err(TlsError::HandshakeFailure);
    }

    let server_share = server_hello
        .extensions
        .find_key_share_sh()
        .ok_or_else(|| TlsError::MissingExtension("key_share (ServerHello)".into()))?;

    let client_kex = secrets
        .remove(&server_share.group)
        .ok_or(TlsError::HandshakeFailure)?;

    // 4. Compute ES and initialise the crypto context.
    let shared_secret = client_kex.agree(&server_share.key_exchange)?;
    drop(secrets); // wipe the unmatched ephemeral keys once the chosen one is used.

    let mut transcript = crate::transcript::Transcript::new(provider, suite);
    transcript.push(&ch_raw);
    transcript.push(&sh_raw);
    let (key_schedule, hs_keys) = KeySchedule::new(provider, suite, &shared_secret, &transcript.hash());

    reader.rekey(DirectionKeys::new(
        provider.aead(suite),
        hs_keys.server_write.key.clone(),
        hs_keys.server_write.iv.clone(),
    ));
    writer.rekey(DirectionKeys::new(
        provider.aead(suite),
        hs_keys.client_write.key.clone(),
        hs_keys.client_write.iv.clone(),
    ));

    // 5. Read EncryptedExtensions, optional Certificate + CertificateVerify, until Finished.
    let mut encrypted_extensions: Option<EncryptedExtensions> = None;
    let mut certificate: Option<Certificate> = None;
    let mut certificate_verify: Option<CertificateVerify> = None;
    let mut cert_transcript_hash: Option<Vec<u8>> = None;

    let (server_finished_raw, finished) = loop {
        let (raw, msg_type, body) = reader.read_message()?;
        match msg_type {
            HandshakeType::encrypted_extensions => {
                if encrypted_extensions.is_some() || certificate.is_some() {
                    return Err(TlsError::UnexpectedMessage(
                        "EncryptedExtensions out of order".into(),
                    ));
                }
                encrypted_extensions = Some(EncryptedExtensions::parse(&mut Cursor::new(body))?);
                transcript.push(&raw);
            }
            HandshakeType::certificate => {
                if certificate.is_some() || certificate_verify.is_some() {
                    return Err(TlsError::UnexpectedMessage("Certificate out of order".into()));
                }
                certificate = Some(Certificate::parse(&mut Cursor::new(body))?);
                transcript.push(&raw);
                cert_transcript_hash = Some(transcript.hash());
            }
            HandshakeType::certificate_verify => {
                if certificate.is_none() || certificate_verify.is_some() {
                    return Err(TlsError::UnexpectedMessage(
                        "CertificateVerify out of order".into(),
                    ));
                }
                certificate_verify = Some(CertificateVerify::parse(&mut Cursor::new(body))?);
                transcript.push(&raw);
            }
            HandshakeType::finished => {
                let finished = Finished::parse(Cursor::new(body))?;
                break (raw, finished);
            }
            other => {
                return Err(TlsError::UnexpectedMessage(format!(
                    "unexpected message {:?} before Finished",
                    other
                )))
            }
        }
    };

    // 6. Verify the server's authentication, if configured.
    let mut peer_chain: Option<Vec<Vec<u8>>> = None;
    if let Some(auth_callback) = &config.auth_callback {
        let certificate = certificate
            .as_ref()
            .ok_or_else(|| TlsError::MissingExtension("Certificate".into()))?;
        let certificate_verify = certificate_verify
            .as_ref()
            .ok_or_else(|| TlsError::MissingExtension("CertificateVerify".into()))?;
        let leaf = certificate
            .certificate_list
            .first()
            .ok_or_else(|| TlsError::BadCertificate("empty certificate chain".into()))?;
        let transcript_hash = cert_transcript_hash
            .ok_or_else(|| TlsError::InternalError("missing transcript hash for Certificate".into()))?;

        let public_key = provider.certificate_public_key(&leaf.cert)?;
        provider
            .verify_signature(
                certificate_verify.algorithm,
                &public_key,
                &transcript_hash,
                &certificate_verify.signature,
            )
            .map_err(|_| TlsError::DecryptError)?;

        let chain: Vec<Vec<u8>> = certificate
            .certificate_list
            .iter()
            .map(|e| e.cert.to_vec())
            .collect();
        auth_callback(&chain).map_err(|_| TlsError::BadCertificate("rejected by auth_callback".into()))?;
        peer_chain = Some(chain);
    }

    // 7. Verify server Finished (constant-time) against transcript up to, not including, Finished.
    let pre_finished_hash = transcript.hash();
    let expected_server_verify_data = key_schedule::finished_verify_data(
        provider,
        suite,
        &hs_keys.server_handshake_traffic_secret,
        &pre_finished_hash,
    );
    if !bool::from(subtle::ConstantTimeEq::ct_eq(
        finished.verify_data.as_ref(),
        expected_server_verify_data.as_slice(),
    )) {
        return Err(TlsError::BadRecordMAC);
    }

    transcript.push(&server_finished_raw);

    // 8. Send our own Finished, then rekey to application traffic keys.
    let full_hash = transcript.hash();
    let client_verify_data = key_schedule::finished_verify_data(
        provider,
        suite,
        &hs_keys.client_handshake_traffic_secret,
        &full_hash,
    );
    writer.write_message(&Handshake::Finished(Finished {
        verify_data: Bytes::from(client_verify_data),
    }))?;

    let app_keys = key_schedule.application_keys(provider, &full_hash);
    reader.rekey(DirectionKeys::new(
        provider.aead(suite),
        app_keys.server_write.key,
        app_keys.server_write.iv,
    ));
    writer.rekey(DirectionKeys::new(
        provider.aead(suite),
        app_keys.client_write.key,
        app_keys.client_write.iv,
    ));

    log::debug!("client handshake complete, suite={:?}", suite);

    Ok(HandshakeSummary {
        cipher_suite: Some(suite),
        peer_certificate_chain: peer_chain,
    })
}

fn random_32() -> [u8; 32] {
    use rand::RngCore;
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}
