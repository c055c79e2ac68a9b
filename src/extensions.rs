//! Hello extensions: a small closed set of known bodies plus an
//! `ExtensionSet` container with TLS's uniqueness-enforcing Add and typed
//! Find operations.

use bytes::Bytes;

use crate::error::{Result, TlsError};
use crate::parsing::{write_varlen_vector, Cursor};
use crate::suite::{NamedGroup, SignatureAndHash};

const SERVER_NAME: u16 = 0;
const SUPPORTED_GROUPS: u16 = 10;
const SIGNATURE_ALGORITHMS: u16 = 13;
const KEY_SHARE: u16 = 51;
/// Not an IANA-assigned number: a private-use extension (range 65280-65535)
/// identifying the draft of this implementation.
const DRAFT_VERSION: u16 = 65280;

/// The context a Hello's extension list is being parsed in. `key_share` has
/// a different body shape depending on which message it appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeContext {
    ClientHello,
    ServerHello,
    EncryptedExtensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: NamedGroup,
    pub key_exchange: Bytes,
}

impl KeyShareEntry {
    fn parse(cursor: &mut Cursor) -> Result<Self> {
        let group = NamedGroup::parse(cursor)?;
        let key_exchange = cursor.read_varlen_vector(1, (1 << 16) - 1)?;
        Ok(KeyShareEntry { group, key_exchange })
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        self.group.serialize(out);
        write_varlen_vector(out, 1, (1 << 16) - 1, |out| {
            out.extend_from_slice(&self.key_exchange)
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    ServerName(String),
    SupportedGroups(Vec<NamedGroup>),
    SignatureAlgorithms(Vec<SignatureAndHash>),
    KeyShareClientHello(Vec<KeyShareEntry>),
    KeyShareServerHello(KeyShareEntry),
    DraftVersion(u16),
    /// Any extension type this implementation does not interpret. Kept
    /// verbatim so uniqueness checking and re-serialisation still work for
    /// extensions a peer sends that we do not care about.
    Unknown { ext_type: u16, body: Bytes },
}

impl Extension {
    fn type_tag(&self) -> u16 {
        match self {
            Extension::ServerName(_) => SERVER_NAME,
            Extension::SupportedGroups(_) => SUPPORTED_GROUPS,
            Extension::SignatureAlgorithms(_) => SIGNATURE_ALGORITHMS,
            Extension::KeyShareClientHello(_) | Extension::KeyShareServerHello(_) => KEY_SHARE,
            Extension::DraftVersion(_) => DRAFT_VERSION,
            Extension::Unknown { ext_type, .. } => *ext_type,
        }
    }

    fn parse_body(ext_type: u16, context: HandshakeContext, body: Bytes) -> Result<Self> {
        let mut cursor = Cursor::new(body.clone());
        Ok(match (ext_type, context) {
            (SERVER_NAME, HandshakeContext::ClientHello) => {
                // ServerNameList: list<1..2^16-1> of (name_type(1) ++ name<1..2^16-1>).
                let list = cursor.read_varlen_vector(1, (1 << 16) - 1)?;
                let mut lc = Cursor::new(list);
                let _name_type = lc.read_u8()?;
                let name = lc.read_varlen_vector(1, (1 << 16) - 1)?;
                let name = String::from_utf8(name.to_vec())
                    .map_err(|_| TlsError::DecodeError("server_name is not valid utf-8".into()))?;
                Extension::ServerName(name)
            }
            (SUPPORTED_GROUPS, _) => {
                let list = cursor.read_varlen_vector(2, (1 << 16) - 1)?;
                let mut lc = Cursor::new(list);
                let mut groups = Vec::new();
                while !lc.is_empty() {
                    groups.push(NamedGroup::parse(&mut lc)?);
                }
                Extension::SupportedGroups(groups)
            }
            (SIGNATURE_ALGORITHMS, _) => {
                let list = cursor.read_varlen_vector(2, (1 << 16) - 1)?;
                let mut lc = Cursor::new(list);
                let mut algos = Vec::new();
                while !lc.is_empty() {
                    algos.push(SignatureAndHash::parse(&mut lc)?);
                }
                Extension::SignatureAlgorithms(algos)
            }
            (KEY_SHARE, HandshakeContext::ClientHello) => {
                let list = cursor.read_varlen_vector(0, (1 << 16) - 1)?;
                let mut lc = Cursor::new(list);
                let mut shares = Vec::new();
                while !lc.is_empty() {
                    shares.push(KeyShareEntry::parse(&mut lc)?);
                }
                Extension::KeyShareClientHello(shares)
            }
            (KEY_SHARE, HandshakeContext::ServerHello) => {
                Extension::KeyShareServerHello(KeyShareEntry::parse(&mut cursor)?)
            }
            (DRAFT_VERSION, _) => Extension::DraftVersion(cursor.read_u16()?),
            (ext_type, _) => Extension::Unknown { ext_type, body },
        })
    }

    fn serialize_body(&self, out: &mut Vec<u8>) {
        match self {
            Extension::ServerName(name) => {
                write_varlen_vector(out, 1, (1 << 16) - 1, |out| {
                    out.push(0); // name_type: host_name
                    write_varlen_vector(out, 1, (1 << 16) - 1, |out| {
                        out.extend_from_slice(name.as_bytes())
                    });
                });
            }
            Extension::SupportedGroups(groups) => {
                write_varlen_vector(out, 2, (1 << 16) - 1, |out| {
                    for g in groups {
                        g.serialize(out);
                    }
                });
            }
            Extension::SignatureAlgorithms(algos) => {
                write_varlen_vector(out, 2, (1 << 16) - 1, |out| {
                    for a in algos {
                        a.serialize(out);
                    }
                });
            }
            Extension::KeyShareClientHello(shares) => {
                write_varlen_vector(out, 0, (1 << 16) - 1, |out| {
                    for s in shares {
                        s.serialize(out);
                    }
                });
            }
            Extension::KeyShareServerHello(share) => share.serialize(out),
            Extension::DraftVersion(v) => out.extend_from_slice(&v.to_be_bytes()),
            Extension::Unknown { body, .. } => out.extend_from_slice(body),
        }
    }
}

/// An ordered collection of extensions with per-type uniqueness, as used by
/// every Hello-shaped message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet(Vec<Extension>);

impl ExtensionSet {
    pub fn new() -> Self {
        ExtensionSet(Vec::new())
    }

    /// Fails if an extension of the same type is already present.
    pub fn add(&mut self, ext: Extension) -> Result<()> {
        let tag = ext.type_tag();
        if self.0.iter().any(|e| e.type_tag() == tag) {
            return Err(TlsError::DecodeError(format!(
                "duplicate extension type {}",
                tag
            )));
        }
        self.0.push(ext);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter()
    }

    pub fn find_server_name(&self) -> Option<&str> {
        self.0.iter().find_map(|e| match e {
            Extension::ServerName(n) => Some(n.as_str()),
            _ => None,
        })
    }

    pub fn find_supported_groups(&self) -> Option<&[NamedGroup]> {
        self.0.iter().find_map(|e| match e {
            Extension::SupportedGroups(g) => Some(g.as_slice()),
            _ => None,
        })
    }

    pub fn find_signature_algorithms(&self) -> Option<&[SignatureAndHash]> {
        self.0.iter().find_map(|e| match e {
            Extension::SignatureAlgorithms(a) => Some(a.as_slice()),
            _ => None,
        })
    }

    pub fn find_key_share_ch(&self) -> Option<&[KeyShareEntry]> {
        self.0.iter().find_map(|e| match e {
            Extension::KeyShareClientHello(s) => Some(s.as_slice()),
            _ => None,
        })
    }

    pub fn find_key_share_sh(&self) -> Option<&KeyShareEntry> {
        self.0.iter().find_map(|e| match e {
            Extension::KeyShareServerHello(s) => Some(s),
            _ => None,
        })
    }

    pub fn find_draft_version(&self) -> Option<u16> {
        self.0.iter().find_map(|e| match e {
            Extension::DraftVersion(v) => Some(*v),
            _ => None,
        })
    }

    pub fn parse(cursor: &mut Cursor, context: HandshakeContext) -> Result<Self> {
        let list = cursor.read_varlen_vector(0, (1 << 16) - 1)?;
        let mut lc = Cursor::new(list);
        let mut set = ExtensionSet::new();
        while !lc.is_empty() {
            let ext_type = lc.read_u16()?;
            let body = lc.read_varlen_vector(0, (1 << 16) - 1)?;
            set.add(Extension::parse_body(ext_type, context, body)?)?;
        }
        Ok(set)
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_varlen_vector(out, 0, (1 << 16) - 1, |out| {
            for ext in &self.0 {
                out.extend_from_slice(&ext.type_tag().to_be_bytes());
                write_varlen_vector(out, 0, (1 << 16) - 1, |out| ext.serialize_body(out));
            }
        });
    }
}
