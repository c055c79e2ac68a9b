//! The server-side handshake driver: group/suite selection, then the
//! ServerHello/EncryptedExtensions/Certificate/CertificateVerify/Finished
//! send sequence. 1-RTT only.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::config::ServerConfig;
use crate::connection::{Connection, HandshakeSummary};
use crate::error::{Result, TlsError};
use crate::extensions::{Extension, ExtensionSet};
use crate::handshake_layer::{HandshakeReader, HandshakeWriter};
use crate::key_schedule::{self, KeySchedule};
use crate::messages::{
    Certificate, CertificateEntry, CertificateVerify, EncryptedExtensions, Finished, Handshake,
    HandshakeType, ServerHello,
};
use crate::parsing::Cursor;
use crate::record::DirectionKeys;
use crate::suite::CryptoProvider;
use crate::transport::Transport;

/// Runs the server handshake to completion on `conn`. See `client::handshake`
/// for the idempotency and locking contract this shares.
pub fn handshake<T: Transport>(conn: &Connection<T>, config: &ServerConfig) -> Result<()> {
    conn.run_handshake(|reader, writer| run(reader, writer, config))
}

fn run<R: Read, W: Write>(
    reader: &mut HandshakeReader<R>,
    writer: &mut HandshakeWriter<W>,
    config: &ServerConfig,
) -> Result<HandshakeSummary> {
    let provider = config.provider.as_ref();

    // 1. Read ClientHello; require its mandatory extensions.
    let (ch_raw, msg_type, body) = reader.read_message()?;
    if msg_type != HandshakeType::client_hello {
        return Err(TlsError::UnexpectedMessage(format!(
            "expected ClientHello, got {:?}",
            msg_type
        )));
    }
    let client_hello = crate::messages::ClientHello::parse(&mut Cursor::new(body))?;

    client_hello
        .extensions
        .find_server_name()
        .ok_or_else(|| TlsError::MissingExtension("server_name".into()))?;
    let client_groups = client_hello
        .extensions
        .find_supported_groups()
        .ok_or_else(|| TlsError::MissingExtension("supported_groups".into()))?;
    client_hello
        .extensions
        .find_signature_algorithms()
        .ok_or_else(|| TlsError::MissingExtension("signature_algorithms".into()))?;
    let client_shares = client_hello
        .extensions
        .find_key_share_ch()
        .ok_or_else(|| TlsError::MissingExtension("key_share".into()))?;

    // 2. Choose a group: first client-offered group present locally, in the
    // client's order, then generate an ephemeral keypair for it and agree.
    let chosen_group = client_groups
        .iter()
        .find(|g| config.supported_groups.contains(g))
        .copied()
        .ok_or(TlsError::HandshakeFailure)?;
    let client_share = client_shares
        .iter()
        .find(|s| s.group == chosen_group)
        .ok_or(TlsError::HandshakeFailure)?;

    let server_kex = provider.generate_key_share(chosen_group);
    let server_public = server_kex.public_bytes();
    let shared_secret = server_kex.agree(&client_share.key_exchange)?;

    // 3. Choose a cipher suite: first client-offered suite present locally,
    // in the client's order.
    let suite = client_hello
        .cipher_suites
        .iter()
        .find(|s| config.supported_cipher_suites.contains(s))
        .copied()
        .ok_or(TlsError::HandshakeFailure)?;

    // 4. Assemble and send ServerHello.
    let mut sh_extensions = ExtensionSet::new();
    sh_extensions.add(Extension::KeyShareServerHello(
        crate::extensions::KeyShareEntry {
            group: chosen_group,
            key_exchange: Bytes::from(server_public),
        },
    ))?;
    sh_extensions.add(Extension::DraftVersion(crate::DRAFT_VERSION))?;

    let server_hello = ServerHello {
        legacy_version: crate::record::LEGACY_RECORD_VERSION,
        random: random_32(),
        legacy_session_id_echo: client_hello.legacy_session_id.clone(),
        cipher_suite: suite,
        legacy_compression_method: 0,
        extensions: sh_extensions,
    };
    let sh_raw = writer.write_message(&Handshake::ServerHello(server_hello))?;

    // 5. Initialise the crypto context and rekey both directions for the
    // handshake phase.
    let mut transcript = crate::transcript::Transcript::new(provider, suite);
    transcript.push(&ch_raw);
    transcript.push(&sh_raw);
    let (key_schedule, hs_keys) = KeySchedule::new(provider, suite, &shared_secret, &transcript.hash());

    reader.rekey(DirectionKeys::new(
        provider.aead(suite),
        hs_keys.client_write.key.clone(),
        hs_keys.client_write.iv.clone(),
    ));
    writer.rekey(DirectionKeys::new(
        provider.aead(suite),
        hs_keys.server_write.key.clone(),
        hs_keys.server_write.iv.clone(),
    ));

    // 6. Send EncryptedExtensions (always, possibly empty), Certificate,
    // CertificateVerify.
    let ee_raw = writer.write_message(&Handshake::EncryptedExtensions(EncryptedExtensions {
        extensions: ExtensionSet::new(),
    }))?;
    transcript.push(&ee_raw);

    let certificate = Certificate {
        certificate_request_context: Bytes::new(),
        certificate_list: config
            .certificate_chain
            .iter()
            .map(|der| CertificateEntry {
                cert: Bytes::from(der.clone()),
                extensions: ExtensionSet::new(),
            })
            .collect(),
    };
    let cert_raw = writer.write_message(&Handshake::Certificate(certificate))?;
    transcript.push(&cert_raw);

    let cert_transcript_hash = transcript.hash();
    let signature = config
        .private_key
        .sign(config.signature_and_hash, &cert_transcript_hash)?;
    let cert_verify_raw = writer.write_message(&Handshake::CertificateVerify(CertificateVerify {
        algorithm: config.signature_and_hash,
        signature: Bytes::from(signature),
    }))?;
    transcript.push(&cert_verify_raw);

    // 7. Send Finished, derived over the transcript up to (not including) it.
    let pre_finished_hash = transcript.hash();
    let server_verify_data = key_schedule::finished_verify_data(
        provider,
        suite,
        &hs_keys.server_handshake_traffic_secret,
        &pre_finished_hash,
    );
    let finished_raw = writer.write_message(&Handshake::Finished(Finished {
        verify_data: Bytes::from(server_verify_data),
    }))?;
    transcript.push(&finished_raw);
    // Transcript through the server's own Finished: both the client's
    // Finished verify_data and the application traffic secrets are derived
    // from this point (RFC 8446 §4.4.4/§7.1), not from the transcript up to
    // (but excluding) the server Finished used above.
    let full_hash = transcript.hash();

    // 8. Read client Finished, verify (constant-time).
    let (client_finished_raw, msg_type, body) = reader.read_message()?;
    if msg_type != HandshakeType::finished {
        return Err(TlsError::UnexpectedMessage(format!(
            "expected Finished, got {:?}",
            msg_type
        )));
    }
    let client_finished = Finished::parse(Cursor::new(body))?;

    let expected_client_verify_data = key_schedule::finished_verify_data(
        provider,
        suite,
        &hs_keys.client_handshake_traffic_secret,
        &full_hash,
    );
    if !bool::from(subtle::ConstantTimeEq::ct_eq(
        client_finished.verify_data.as_ref(),
        expected_client_verify_data.as_slice(),
    )) {
        return Err(TlsError::BadRecordMAC);
    }
    transcript.push(&client_finished_raw);

    let app_keys = key_schedule.application_keys(provider, &full_hash);
    reader.rekey(DirectionKeys::new(
        provider.aead(suite),
        app_keys.client_write.key,
        app_keys.client_write.iv,
    ));
    writer.rekey(DirectionKeys::new(
        provider.aead(suite),
        app_keys.server_write.key,
        app_keys.server_write.iv,
    ));

    log::debug!("server handshake complete, suite={:?}", suite);

    Ok(HandshakeSummary {
        cipher_suite: Some(suite),
        peer_certificate_chain: None,
    })
}

fn random_32() -> [u8; 32] {
    use rand::RngCore;
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}
