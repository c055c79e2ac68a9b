//! End-to-end handshake scenarios against the reference crypto suite. Each
//! scenario runs client and server on opposite ends of a loopback
//! `TcpStream` pair, in separate threads.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;

use tls13::config::{ClientConfig, ServerConfig};
use tls13::error::TlsError;
use tls13::extensions::{Extension, ExtensionSet, KeyShareEntry};
use tls13::messages::{Handshake, ServerHello};
use tls13::record::{self, ContentType, DirectionKeys, Record};
use tls13::reference::{EcdsaSigner, ReferenceProvider};
use tls13::suite::{CipherSuite, CryptoProvider, HashAlgorithm, NamedGroup, SignatureAlgorithm, SignatureAndHash};

fn loopback_pair() -> (TcpStream, TcpStream) {
    let _ = env_logger::builder().is_test(true).try_init();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

fn server_config(groups: Vec<NamedGroup>, suites: Vec<CipherSuite>) -> ServerConfig {
    let key = EcdsaSigner::generate_p256();
    let cert = key.public_key_bytes();
    let signature_and_hash = SignatureAndHash::new(HashAlgorithm::sha256, SignatureAlgorithm::ecdsa);
    let mut config = ServerConfig::new(
        Arc::new(ReferenceProvider),
        vec![cert],
        Arc::new(key),
        signature_and_hash,
    );
    config.supported_groups = groups;
    config.supported_cipher_suites = suites;
    config
}

fn client_config(server_name: &str, groups: Vec<NamedGroup>) -> ClientConfig {
    let mut config = ClientConfig::recommended(Arc::new(ReferenceProvider), server_name);
    config.supported_groups = groups;
    config
}

#[test]
fn handshake_completes_and_exchanges_application_data() {
    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(
        vec![NamedGroup::P256, NamedGroup::P384],
        vec![CipherSuite::EcdheRsaAes128GcmSha256],
    );
    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);

    let server_thread = thread::spawn(move || {
        let conn = tls13::accept(server_sock, &server_cfg).expect("server handshake");
        let mut buf = [0u8; 4];
        let n = conn.read(&mut buf).expect("server read");
        assert_eq!(&buf[..n], b"ping");
        conn.write(b"pong").expect("server write");
    });

    let conn = tls13::connect(client_sock, &client_cfg).expect("client handshake");
    conn.write(b"ping").expect("client write");
    let mut buf = [0u8; 4];
    let n = conn.read(&mut buf).expect("client read");
    assert_eq!(&buf[..n], b"pong");

    server_thread.join().unwrap();
}

#[test]
fn mismatched_groups_fail_the_handshake_on_both_sides() {
    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(vec![NamedGroup::P256], vec![CipherSuite::EcdheRsaAes128GcmSha256]);
    let client_cfg = client_config("example.com", vec![NamedGroup::P384]);

    let server_thread = thread::spawn(move || {
        let err = tls13::accept(server_sock, &server_cfg).unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure));
    });

    let client_err = tls13::connect(client_sock, &client_cfg).unwrap_err();
    // The server never sends a ServerHello with a matching key_share (it
    // fails before responding at all), so the client's read fails -- either
    // as a transport error (peer closed) or a protocol error, never success.
    assert!(!matches!(client_err, TlsError::CloseNotify));

    server_thread.join().unwrap();
}

#[test]
fn split_client_hello_still_handshakes() {
    use std::net::Shutdown;

    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(
        vec![NamedGroup::P256, NamedGroup::P384],
        vec![CipherSuite::EcdheRsaAes128GcmSha256],
    );
    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);

    let server_thread = thread::spawn(move || {
        tls13::accept(server_sock, &server_cfg).expect("server handshake despite split ClientHello");
    });

    // Build the ClientHello by hand via the ordinary client path is not
    // available without reaching into the driver, so instead we drive a
    // real client handshake over a proxy thread that forwards bytes one at
    // a time for the first two writes, splitting the first record into a
    // 5-byte chunk and the remainder -- this exercises the handshake
    // layer's reassembly without needing a second Transport impl.
    struct SplittingStream {
        inner: TcpStream,
        first_write: bool,
    }

    impl Read for SplittingStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for SplittingStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.first_write && buf.len() > 5 {
                self.first_write = false;
                let n = self.inner.write(&buf[..5])?;
                debug_assert_eq!(n, 5);
                Ok(5)
            } else {
                self.inner.write(buf)
            }
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl tls13::transport::ReadTransport for SplittingStream {
        fn set_read_timeout(&mut self, dur: Option<std::time::Duration>) -> std::io::Result<()> {
            self.inner.set_read_timeout(dur)
        }
    }

    impl tls13::transport::WriteTransport for SplittingStream {
        fn set_write_timeout(&mut self, dur: Option<std::time::Duration>) -> std::io::Result<()> {
            self.inner.set_write_timeout(dur)
        }
        fn shutdown(&mut self) -> std::io::Result<()> {
            self.inner.shutdown(Shutdown::Both)
        }
    }

    impl tls13::transport::Transport for SplittingStream {
        type Reader = SplittingStream;
        type Writer = SplittingStream;

        fn split(self) -> tls13::error::Result<(SplittingStream, SplittingStream)> {
            let writer = SplittingStream {
                inner: self.inner.try_clone()?,
                first_write: self.first_write,
            };
            Ok((self, writer))
        }
        fn local_addr(&self) -> tls13::error::Result<std::net::SocketAddr> {
            Ok(self.inner.local_addr()?)
        }
        fn peer_addr(&self) -> tls13::error::Result<std::net::SocketAddr> {
            Ok(self.inner.peer_addr()?)
        }
    }

    let split_client = SplittingStream {
        inner: client_sock,
        first_write: true,
    };
    tls13::connect(split_client, &client_cfg).expect("client handshake with a split first write");

    server_thread.join().unwrap();
}

#[test]
fn close_notify_surfaces_as_eof_on_the_peer() {
    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(
        vec![NamedGroup::P256, NamedGroup::P384],
        vec![CipherSuite::EcdheRsaAes128GcmSha256],
    );
    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);

    let server_thread = thread::spawn(move || {
        let conn = tls13::accept(server_sock, &server_cfg).expect("server handshake");
        let mut buf = [0u8; 8];
        let n = conn.read(&mut buf).expect("server read after client close");
        assert_eq!(n, 0);
    });

    let conn = tls13::connect(client_sock, &client_cfg).expect("client handshake");
    conn.close().expect("client close");

    server_thread.join().unwrap();
}

#[test]
fn concurrent_writes_do_not_interleave_fragments() {
    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(
        vec![NamedGroup::P256, NamedGroup::P384],
        vec![CipherSuite::EcdheRsaAes128GcmSha256],
    );
    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);

    let server_thread = thread::spawn(move || {
        let conn = tls13::accept(server_sock, &server_cfg).expect("server handshake");
        let mut total = Vec::new();
        let mut buf = [0u8; 4096];
        while total.len() < 40 * 1024 {
            let n = conn.read(&mut buf).expect("server read");
            assert_ne!(n, 0, "connection closed before all bytes arrived");
            total.extend_from_slice(&buf[..n]);
        }
        assert_eq!(total.len(), 40 * 1024);
        // Each write used a single repeated byte; verify no interleaving by
        // checking every contiguous MAX_FRAGMENT_LEN-sized run is internally
        // uniform would be too strict across record boundaries, so instead
        // check the two expected byte values each appear exactly 20 KiB times.
        let ones = total.iter().filter(|&&b| b == 1u8).count();
        let twos = total.iter().filter(|&&b| b == 2u8).count();
        assert_eq!(ones, 20 * 1024);
        assert_eq!(twos, 20 * 1024);
    });

    let conn = Arc::new(tls13::connect(client_sock, &client_cfg).expect("client handshake"));
    let conn_a = conn.clone();
    let conn_b = conn.clone();

    let payload_a = vec![1u8; 20 * 1024];
    let payload_b = vec![2u8; 20 * 1024];

    let t1 = thread::spawn(move || conn_a.write(&payload_a).expect("write a"));
    let t2 = thread::spawn(move || conn_b.write(&payload_b).expect("write b"));
    t1.join().unwrap();
    t2.join().unwrap();

    server_thread.join().unwrap();
}

#[test]
fn corrupted_ciphertext_is_sticky_bad_record_mac() {
    use std::net::Shutdown;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Wraps the client's socket and flips a bit in the body of the next
    // ciphertext-sized write once armed, leaving the (always 5-byte) record
    // header untouched so the server still frames the record correctly and
    // only the AEAD open fails.
    struct CorruptingStream {
        inner: TcpStream,
        corrupt_next_payload: Arc<AtomicBool>,
    }

    impl Read for CorruptingStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for CorruptingStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.len() > 5 && self.corrupt_next_payload.swap(false, Ordering::SeqCst) {
                let mut corrupted = buf.to_vec();
                let mid = corrupted.len() / 2;
                corrupted[mid] ^= 0xff;
                return self.inner.write(&corrupted);
            }
            self.inner.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl tls13::transport::ReadTransport for CorruptingStream {
        fn set_read_timeout(&mut self, dur: Option<std::time::Duration>) -> std::io::Result<()> {
            self.inner.set_read_timeout(dur)
        }
    }

    impl tls13::transport::WriteTransport for CorruptingStream {
        fn set_write_timeout(&mut self, dur: Option<std::time::Duration>) -> std::io::Result<()> {
            self.inner.set_write_timeout(dur)
        }
        fn shutdown(&mut self) -> std::io::Result<()> {
            self.inner.shutdown(Shutdown::Both)
        }
    }

    impl tls13::transport::Transport for CorruptingStream {
        type Reader = CorruptingStream;
        type Writer = CorruptingStream;

        fn split(self) -> tls13::error::Result<(CorruptingStream, CorruptingStream)> {
            let writer = CorruptingStream {
                inner: self.inner.try_clone()?,
                corrupt_next_payload: self.corrupt_next_payload.clone(),
            };
            Ok((self, writer))
        }
        fn local_addr(&self) -> tls13::error::Result<std::net::SocketAddr> {
            Ok(self.inner.local_addr()?)
        }
        fn peer_addr(&self) -> tls13::error::Result<std::net::SocketAddr> {
            Ok(self.inner.peer_addr()?)
        }
    }

    let (client_sock, server_sock) = loopback_pair();

    let server_cfg = server_config(
        vec![NamedGroup::P256, NamedGroup::P384],
        vec![CipherSuite::EcdheRsaAes128GcmSha256],
    );
    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);

    let server_thread = thread::spawn(move || {
        let conn = tls13::accept(server_sock, &server_cfg).expect("server handshake");
        let mut buf = [0u8; 64];
        let first = conn.read(&mut buf);
        assert!(matches!(first, Err(TlsError::BadRecordMAC)), "got {:?}", first);
        let second = conn.read(&mut buf);
        assert!(matches!(second, Err(TlsError::BadRecordMAC)), "error must be sticky");
    });

    let corrupt_next_payload = Arc::new(AtomicBool::new(false));
    let corrupting_client = CorruptingStream {
        inner: client_sock,
        corrupt_next_payload: corrupt_next_payload.clone(),
    };
    let conn = tls13::connect(corrupting_client, &client_cfg).expect("client handshake");

    corrupt_next_payload.store(true, Ordering::SeqCst);
    conn.write(b"this will be corrupted").expect("client write");

    server_thread.join().unwrap();
}

#[test]
fn server_echoing_an_unoffered_group_fails_the_client() {
    // A real server never does this; we hand-assemble a ServerHello that
    // picks a group the client never offered a key_share for, bypassing the
    // server driver entirely, to exercise the client's own enforcement of
    // DESIGN.md/§8's "group enforcement" property.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let client_cfg = client_config("example.com", vec![NamedGroup::P256]);
    let client_thread = thread::spawn(move || {
        let sock = TcpStream::connect(addr).unwrap();
        let err = tls13::connect(sock, &client_cfg).unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure), "got {:?}", err);
    });

    let (mut server_sock, _) = listener.accept().unwrap();
    // Drain the (plaintext) ClientHello record; its contents don't matter.
    record::read_record(&mut server_sock, None).unwrap();

    let mut extensions = ExtensionSet::new();
    extensions
        .add(Extension::KeyShareServerHello(KeyShareEntry {
            group: NamedGroup::P384,
            key_exchange: Bytes::from(vec![4u8; 97]),
        }))
        .unwrap();
    extensions.add(Extension::DraftVersion(tls13::DRAFT_VERSION)).unwrap();

    let server_hello = ServerHello {
        legacy_version: tls13::record::LEGACY_RECORD_VERSION,
        random: [0u8; 32],
        legacy_session_id_echo: Bytes::new(),
        cipher_suite: CipherSuite::EcdheRsaAes128GcmSha256,
        legacy_compression_method: 0,
        extensions,
    };
    let raw = Handshake::ServerHello(server_hello).serialize();
    let rec = Record {
        content_type: ContentType::handshake,
        data: Bytes::from(raw),
    };
    record::write_record(&mut server_sock, None, &rec).unwrap();

    client_thread.join().unwrap();
}

#[test]
fn auth_callback_receives_the_verified_chain() {
    use std::sync::Mutex;

    let (client_sock, server_sock) = loopback_pair();

    let key = EcdsaSigner::generate_p256();
    let cert = key.public_key_bytes();
    let server_cfg = ServerConfig::new(
        Arc::new(ReferenceProvider),
        vec![cert.clone()],
        Arc::new(key),
        SignatureAndHash::new(HashAlgorithm::sha256, SignatureAlgorithm::ecdsa),
    );

    let received_chain: Arc<Mutex<Option<Vec<Vec<u8>>>>> = Arc::new(Mutex::new(None));
    let received_chain2 = received_chain.clone();
    let mut client_cfg = client_config("example.com", vec![NamedGroup::P256]);
    client_cfg.auth_callback = Some(Arc::new(move |chain: &[Vec<u8>]| {
        *received_chain2.lock().unwrap() = Some(chain.to_vec());
        Ok(())
    }));

    let server_thread = thread::spawn(move || {
        tls13::accept(server_sock, &server_cfg).expect("server handshake");
    });

    tls13::connect(client_sock, &client_cfg).expect("client handshake with auth callback");
    server_thread.join().unwrap();

    assert_eq!(received_chain.lock().unwrap().as_deref(), Some(&[cert][..]));
}

#[test]
fn corrupted_certificate_verify_signature_fails_with_decrypt_error() {
    // A `Signer` that signs correctly once for the wire-format round-trip
    // but hands back garbage bytes of the same length, so the record layer
    // (AEAD) stays happy and only the signature check itself can fail.
    struct LyingSigner(EcdsaSigner);

    impl tls13::suite::Signer for LyingSigner {
        fn sign(
            &self,
            sig_and_hash: SignatureAndHash,
            message: &[u8],
        ) -> tls13::error::Result<Vec<u8>> {
            let mut sig = self.0.sign(sig_and_hash, message)?;
            let last = sig.len() - 1;
            sig[last] ^= 0xff;
            Ok(sig)
        }
    }

    let (client_sock, server_sock) = loopback_pair();

    let key = EcdsaSigner::generate_p256();
    let cert = key.public_key_bytes();
    let server_cfg = ServerConfig::new(
        Arc::new(ReferenceProvider),
        vec![cert],
        Arc::new(LyingSigner(key)),
        SignatureAndHash::new(HashAlgorithm::sha256, SignatureAlgorithm::ecdsa),
    );

    let mut client_cfg = client_config("example.com", vec![NamedGroup::P256]);
    client_cfg.auth_callback = Some(Arc::new(|_chain: &[Vec<u8>]| Ok(())));

    let server_thread = thread::spawn(move || {
        // The server completes its own side of the handshake regardless --
        // it never learns the client rejected its signature.
        let _ = tls13::accept(server_sock, &server_cfg);
    });

    let err = tls13::connect(client_sock, &client_cfg).unwrap_err();
    assert!(matches!(err, TlsError::DecryptError), "got {:?}", err);

    server_thread.join().unwrap();
}

#[test]
fn application_data_keyed_for_one_direction_does_not_decrypt_under_the_other() {
    // "client write" and "client read" (i.e. the peer's write) traffic
    // secrets are derived under distinct labels ("c ap traffic" vs.
    // "s ap traffic"); ciphertext sealed under one must never open under
    // the other. Exercised directly at the record layer, independent of any
    // transport or handshake driver.
    let provider = ReferenceProvider;
    let suite = CipherSuite::EcdheRsaAes128GcmSha256;

    let shared_secret = vec![0x42u8; 32];
    let ch_sh_hash = vec![0u8; suite.hash_len()];
    let (key_schedule, _hs_keys) = tls13::key_schedule::KeySchedule::new(&provider, suite, &shared_secret, &ch_sh_hash);
    let full_hash = vec![1u8; suite.hash_len()];
    let app_keys = key_schedule.application_keys(&provider, &full_hash);

    let mut client_write = DirectionKeys::new(
        provider.aead(suite),
        app_keys.client_write.key.clone(),
        app_keys.client_write.iv.clone(),
    );
    let mut client_read = DirectionKeys::new(
        provider.aead(suite),
        app_keys.server_write.key.clone(),
        app_keys.server_write.iv.clone(),
    );

    let rec = Record {
        content_type: ContentType::application_data,
        data: Bytes::from_static(b"a secret only the real peer should read"),
    };
    let mut wire = Vec::new();
    record::write_record(&mut wire, Some(&mut client_write), &rec).unwrap();

    let mut cursor = std::io::Cursor::new(wire.clone());
    let err = record::read_record(&mut cursor, Some(&mut client_read)).unwrap_err();
    assert!(matches!(err, TlsError::BadRecordMAC), "got {:?}", err);

    // Sanity check: the same ciphertext does open under the key it was
    // actually sealed with (a "client write" peer reading its own output
    // would never happen in practice, but confirms the failure above is
    // about key mismatch, not a broken fixture).
    let mut resealed_reader = DirectionKeys::new(
        provider.aead(suite),
        app_keys.client_write.key.clone(),
        app_keys.client_write.iv.clone(),
    );
    let mut cursor = std::io::Cursor::new(wire);
    let opened = record::read_record(&mut cursor, Some(&mut resealed_reader)).unwrap();
    assert_eq!(&opened.data[..], b"a secret only the real peer should read");
}
