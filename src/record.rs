//! The record layer: frames the raw transport byte stream into typed
//! records, and applies AEAD protection once a direction has been keyed.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::{Result, TlsError};
use crate::suite::Aead;
use crate::tls_enum_u8;

tls_enum_u8!(ContentType =>
    invalid(0),
    change_cipher_spec(20),
    alert(21),
    handshake(22),
    application_data(23)
);

/// Fixed legacy version carried in every record header. Real TLS 1.3 peers
/// ignore this field's value beyond a sanity check; we do not attempt
/// version-downgrade interop since TLS <= 1.2 fallback is out of scope.
pub const LEGACY_RECORD_VERSION: u16 = 0x0303;

/// Maximum plaintext fragment length.
pub const MAX_FRAGMENT_LEN: usize = 1 << 14;

/// Maximum ciphertext length: plaintext plus the inner content-type byte,
/// plus up to 255 bytes of zero padding, plus AEAD tag overhead.
pub const MAX_CIPHERTEXT_LEN: usize = MAX_FRAGMENT_LEN + 256;

#[derive(Debug, Clone)]
pub struct Record {
    pub content_type: ContentType,
    pub data: Bytes,
}

/// The AEAD key material and sequence counter for one direction. Replacing
/// this (via `Rekey`) is always an atomic swap of the whole struct, done
/// under the direction's lock.
pub struct DirectionKeys {
    aead: Box<dyn Aead>,
    key: Vec<u8>,
    iv: Vec<u8>,
    sequence: u64,
}

impl DirectionKeys {
    pub fn new(aead: Box<dyn Aead>, key: Vec<u8>, iv: Vec<u8>) -> Self {
        DirectionKeys {
            aead,
            key,
            iv,
            sequence: 0,
        }
    }

    fn next_nonce(&mut self) -> Result<Vec<u8>> {
        if self.sequence == u64::MAX {
            return Err(TlsError::InternalError(
                "record sequence number exhausted".into(),
            ));
        }
        let mut nonce = self.iv.clone();
        let seq = self.sequence.to_be_bytes();
        let n = nonce.len();
        for i in 0..8.min(n) {
            nonce[n - 8 + i] ^= seq[i];
        }
        self.sequence += 1;
        Ok(nonce)
    }
}

fn record_header(content_type: u8, len: usize) -> [u8; 5] {
    let len = len as u16;
    let v = LEGACY_RECORD_VERSION.to_be_bytes();
    let l = len.to_be_bytes();
    [content_type, v[0], v[1], l[0], l[1]]
}

/// Reads one record from `transport`, decrypting it if `keys` is `Some`.
pub fn read_record<R: Read>(transport: &mut R, keys: Option<&mut DirectionKeys>) -> Result<Record> {
    let mut header = [0u8; 5];
    transport.read_exact(&mut header)?;
    let outer_type = header[0];
    let len = u16::from_be_bytes([header[3], header[4]]) as usize;

    let max_len = if keys.is_some() {
        MAX_CIPHERTEXT_LEN
    } else {
        MAX_FRAGMENT_LEN
    };
    if len > max_len {
        return Err(TlsError::RecordOverflow);
    }

    let mut body = vec![0u8; len];
    transport.read_exact(&mut body)?;

    match keys {
        None => Ok(Record {
            content_type: ContentType::from_u8(outer_type),
            data: Bytes::from(body),
        }),
        Some(keys) => {
            let nonce = keys.next_nonce()?;
            let plaintext = keys
                .aead
                .open(&keys.key, &nonce, &header, &body)
                .map_err(|_| TlsError::BadRecordMAC)?;

            // Plaintext is `data ++ content_type ++ zero-padding*`. Find the
            // real content type by scanning back from the end for the last
            // non-zero byte.
            let mut end = plaintext.len();
            while end > 0 && plaintext[end - 1] == 0 {
                end -= 1;
            }
            if end == 0 {
                return Err(TlsError::DecodeError(
                    "decrypted record carried no inner content type".into(),
                ));
            }
            if end - 1 > MAX_FRAGMENT_LEN {
                return Err(TlsError::RecordOverflow);
            }
            let content_type = ContentType::from_u8(plaintext[end - 1]);
            let data = Bytes::copy_from_slice(&plaintext[..end - 1]);
            Ok(Record { content_type, data })
        }
    }
}

/// Writes one record to `transport`, encrypting it if `keys` is `Some`.
/// `record.data` must not exceed `MAX_FRAGMENT_LEN`; the handshake and
/// connection layers are responsible for fragmenting larger payloads.
pub fn write_record<W: Write>(
    transport: &mut W,
    keys: Option<&mut DirectionKeys>,
    record: &Record,
) -> Result<()> {
    if record.data.len() > MAX_FRAGMENT_LEN {
        return Err(TlsError::RecordOverflow);
    }

    match keys {
        None => {
            let header = record_header(record.content_type.to_u8(), record.data.len());
            transport.write_all(&header)?;
            transport.write_all(&record.data)?;
            Ok(())
        }
        Some(keys) => {
            let nonce = keys.next_nonce()?;
            let mut inner = Vec::with_capacity(record.data.len() + 1);
            inner.extend_from_slice(&record.data);
            inner.push(record.content_type.to_u8());

            // Header's length field must reflect the ciphertext length (tag
            // included), so we compute the AAD after sizing it, not before.
            let ciphertext_len = inner.len() + 16; // AEADs in scope all have a 16-byte tag.
            let header = record_header(ContentType::application_data.to_u8(), ciphertext_len);
            let ciphertext = keys.aead.seal(&keys.key, &nonce, &header, &inner);
            debug_assert_eq!(ciphertext.len(), ciphertext_len);

            transport.write_all(&header)?;
            transport.write_all(&ciphertext)?;
            Ok(())
        }
    }
}

