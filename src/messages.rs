//! Handshake message bodies: ClientHello, ServerHello, EncryptedExtensions,
//! Certificate, CertificateVerify, Finished.
//!
//! Unlike the simpler `tls_struct!`-declared types (Alert), these bodies
//! need context-sensitive extension parsing (ClientHello vs. ServerHello
//! shape the `key_share` extension differently), so they are written out by
//! hand rather than via the macro.

use bytes::Bytes;

use crate::error::{Result, TlsError};
use crate::extensions::{Extension, ExtensionSet, HandshakeContext};
use crate::parsing::{write_u24, write_varlen_vector, Cursor};
use crate::suite::{CipherSuite, SignatureAndHash};
use crate::tls_enum_u8;

tls_enum_u8!(HandshakeType =>
    client_hello(1),
    server_hello(2),
    encrypted_extensions(8),
    certificate(11),
    certificate_verify(15),
    finished(20)
);

#[derive(Debug, Clone)]
pub struct ClientHello {
    pub legacy_version: u16,
    pub random: [u8; 32],
    pub legacy_session_id: Bytes,
    pub cipher_suites: Vec<CipherSuite>,
    pub legacy_compression_methods: Bytes,
    pub extensions: ExtensionSet,
}

impl ClientHello {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let legacy_version = cursor.read_u16()?;
        let random_bytes = cursor.take_exact(32)?;
        let mut random = [0u8; 32];
        random.copy_from_slice(&random_bytes);
        let legacy_session_id = cursor.read_varlen_vector(0, 32)?;

        let suites_body = cursor.read_varlen_vector(2, (1 << 16) - 2)?;
        let mut sc = Cursor::new(suites_body);
        let mut cipher_suites = Vec::new();
        while !sc.is_empty() {
            let v = sc.read_u16()?;
            // Unrecognised suites (e.g. a peer's GREASE values) are skipped
            // rather than rejected -- the list only needs to contain one
            // suite we do understand.
            if let Some(s) = CipherSuite::from_u16(v) {
                cipher_suites.push(s);
            }
        }

        let legacy_compression_methods = cursor.read_varlen_vector(1, 255)?;
        let extensions = ExtensionSet::parse(cursor, HandshakeContext::ClientHello)?;

        Ok(ClientHello {
            legacy_version,
            random,
            legacy_session_id,
            cipher_suites,
            legacy_compression_methods,
            extensions,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.legacy_version.to_be_bytes());
        out.extend_from_slice(&self.random);
        write_varlen_vector(out, 0, 32, |out| out.extend_from_slice(&self.legacy_session_id));
        write_varlen_vector(out, 2, (1 << 16) - 2, |out| {
            for s in &self.cipher_suites {
                s.serialize(out);
            }
        });
        write_varlen_vector(out, 1, 255, |out| {
            out.extend_from_slice(&self.legacy_compression_methods)
        });
        self.extensions.serialize(out);
    }
}

#[derive(Debug, Clone)]
pub struct ServerHello {
    pub legacy_version: u16,
    pub random: [u8; 32],
    pub legacy_session_id_echo: Bytes,
    pub cipher_suite: CipherSuite,
    pub legacy_compression_method: u8,
    pub extensions: ExtensionSet,
}

impl ServerHello {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let legacy_version = cursor.read_u16()?;
        let random_bytes = cursor.take_exact(32)?;
        let mut random = [0u8; 32];
        random.copy_from_slice(&random_bytes);
        let legacy_session_id_echo = cursor.read_varlen_vector(0, 32)?;
        let cipher_suite = CipherSuite::parse(cursor)?;
        let legacy_compression_method = cursor.read_u8()?;
        let extensions = ExtensionSet::parse(cursor, HandshakeContext::ServerHello)?;

        Ok(ServerHello {
            legacy_version,
            random,
            legacy_session_id_echo,
            cipher_suite,
            legacy_compression_method,
            extensions,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.legacy_version.to_be_bytes());
        out.extend_from_slice(&self.random);
        write_varlen_vector(out, 0, 32, |out| {
            out.extend_from_slice(&self.legacy_session_id_echo)
        });
        self.cipher_suite.serialize(out);
        out.push(self.legacy_compression_method);
        self.extensions.serialize(out);
    }
}

#[derive(Debug, Clone)]
pub struct EncryptedExtensions {
    pub extensions: ExtensionSet,
}

impl EncryptedExtensions {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        Ok(EncryptedExtensions {
            extensions: ExtensionSet::parse(cursor, HandshakeContext::EncryptedExtensions)?,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        self.extensions.serialize(out);
    }
}

#[derive(Debug, Clone)]
pub struct CertificateEntry {
    pub cert: Bytes,
    pub extensions: ExtensionSet,
}

#[derive(Debug, Clone)]
pub struct Certificate {
    pub certificate_request_context: Bytes,
    pub certificate_list: Vec<CertificateEntry>,
}

impl Certificate {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let certificate_request_context = cursor.read_varlen_vector(0, 255)?;
        let list_body = cursor.read_varlen_vector(0, (1 << 24) - 1)?;
        let mut lc = Cursor::new(list_body);
        let mut certificate_list = Vec::new();
        while !lc.is_empty() {
            let cert = lc.read_varlen_vector(1, (1 << 24) - 1)?;
            let extensions = ExtensionSet::parse(&mut lc, HandshakeContext::EncryptedExtensions)?;
            certificate_list.push(CertificateEntry { cert, extensions });
        }
        Ok(Certificate {
            certificate_request_context,
            certificate_list,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_varlen_vector(out, 0, 255, |out| {
            out.extend_from_slice(&self.certificate_request_context)
        });
        write_varlen_vector(out, 0, (1 << 24) - 1, |out| {
            for entry in &self.certificate_list {
                write_varlen_vector(out, 1, (1 << 24) - 1, |out| out.extend_from_slice(&entry.cert));
                entry.extensions.serialize(out);
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct CertificateVerify {
    pub algorithm: SignatureAndHash,
    pub signature: Bytes,
}

impl CertificateVerify {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let algorithm = SignatureAndHash::parse(cursor)?;
        let signature = cursor.read_varlen_vector(0, (1 << 16) - 1)?;
        Ok(CertificateVerify { algorithm, signature })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        self.algorithm.serialize(out);
        write_varlen_vector(out, 0, (1 << 16) - 1, |out| out.extend_from_slice(&self.signature));
    }
}

/// `verify_data`'s length is not self-describing on the wire: it is exactly
/// the negotiated hash's output length, known only to the caller, so
/// `parse` just consumes the entire remaining message body.
#[derive(Debug, Clone)]
pub struct Finished {
    pub verify_data: Bytes,
}

impl Finished {
    pub fn parse(cursor: Cursor) -> Result<Self> {
        Ok(Finished {
            verify_data: cursor.rest(),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.verify_data);
    }
}

#[derive(Debug, Clone)]
pub enum Handshake {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    EncryptedExtensions(EncryptedExtensions),
    Certificate(Certificate),
    CertificateVerify(CertificateVerify),
    Finished(Finished),
}

impl Handshake {
    pub fn msg_type(&self) -> HandshakeType {
        match self {
            Handshake::ClientHello(_) => HandshakeType::client_hello,
            Handshake::ServerHello(_) => HandshakeType::server_hello,
            Handshake::EncryptedExtensions(_) => HandshakeType::encrypted_extensions,
            Handshake::Certificate(_) => HandshakeType::certificate,
            Handshake::CertificateVerify(_) => HandshakeType::certificate_verify,
            Handshake::Finished(_) => HandshakeType::finished,
        }
    }

    /// Parses a handshake body given its declared type. `body` must be
    /// exactly the body bytes (the 4-byte type+length header already
    /// stripped by the handshake layer).
    pub fn parse(msg_type: HandshakeType, body: Bytes) -> Result<Self> {
        let mut cursor = Cursor::new(body);
        Ok(match msg_type {
            HandshakeType::client_hello => Handshake::ClientHello(ClientHello::parse(&mut cursor)?),
            HandshakeType::server_hello => Handshake::ServerHello(ServerHello::parse(&mut cursor)?),
            HandshakeType::encrypted_extensions => {
                Handshake::EncryptedExtensions(EncryptedExtensions::parse(&mut cursor)?)
            }
            HandshakeType::certificate => Handshake::Certificate(Certificate::parse(&mut cursor)?),
            HandshakeType::certificate_verify => {
                Handshake::CertificateVerify(CertificateVerify::parse(&mut cursor)?)
            }
            HandshakeType::finished => Handshake::Finished(Finished::parse(cursor)?),
            HandshakeType::unknown(v) => {
                return Err(TlsError::UnexpectedMessage(format!(
                    "unrecognised handshake message type {}",
                    v
                )))
            }
        })
    }

    fn serialize_body(&self, out: &mut Vec<u8>) {
        match self {
            Handshake::ClientHello(m) => m.serialize(out),
            Handshake::ServerHello(m) => m.serialize(out),
            Handshake::EncryptedExtensions(m) => m.serialize(out),
            Handshake::Certificate(m) => m.serialize(out),
            Handshake::CertificateVerify(m) => m.serialize(out),
            Handshake::Finished(m) => m.serialize(out),
        }
    }

    /// Serialises the full wire form: `type(1) ++ length(3) ++ body`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        self.serialize_body(&mut body);

        let mut out = Vec::with_capacity(4 + body.len());
        out.push(self.msg_type().to_u8());
        write_u24(&mut out, body.len() as u32);
        out.extend_from_slice(&body);
        out
    }
}

impl Extension {
    /// Convenience used by the drivers when asserting a required extension
    /// from a parsed set rather than a raw list (kept here to avoid a
    /// circular module dependency between `extensions` and `messages`).
    pub fn require<T>(found: Option<T>, name: &'static str) -> Result<T> {
        found.ok_or_else(|| TlsError::MissingExtension(name.into()))
    }
}
