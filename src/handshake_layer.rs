//! The handshake layer: reassembles whole handshake messages out of the
//! record layer's stream of Handshake-content records, and fragments
//! outgoing messages back into records.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::error::{Result, TlsError};
use crate::parsing::Cursor;
use crate::record::{self, ContentType, DirectionKeys, Record, MAX_FRAGMENT_LEN};

/// Reads whole handshake messages off one direction of the record layer.
pub struct HandshakeReader<R: Read> {
    transport: R,
    keys: Option<DirectionKeys>,
    buffer: Vec<u8>,
    /// Application data already pulled off the wire but not yet consumed by
    /// the caller's `Read`, since a caller's buffer may be smaller than one
    /// record.
    app_buffer: Vec<u8>,
}

impl<R: Read> HandshakeReader<R> {
    pub fn new(transport: R) -> Self {
        HandshakeReader {
            transport,
            keys: None,
            buffer: Vec::new(),
            app_buffer: Vec::new(),
        }
    }

    /// Drains buffered application data into `dst`, pulling more records as
    /// needed. A zero-length ApplicationData record is legal and yields no
    /// bytes, so it is skipped rather than returned.
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        while self.app_buffer.is_empty() {
            let data = self.read_application_data()?;
            if !data.is_empty() {
                self.app_buffer = data.to_vec();
            }
        }
        let n = dst.len().min(self.app_buffer.len());
        dst[..n].copy_from_slice(&self.app_buffer[..n]);
        self.app_buffer.drain(0..n);
        Ok(n)
    }

    pub fn transport_mut(&mut self) -> &mut R {
        &mut self.transport
    }

    /// Replaces the inbound AEAD state. Callers must only do this at a
    /// message boundary (i.e. with `buffer` empty), which the drivers
    /// guarantee by construction.
    pub fn rekey(&mut self, keys: DirectionKeys) {
        debug_assert!(self.buffer.is_empty());
        self.keys = Some(keys);
    }

    /// Reads one post-handshake record, returning its application data.
    /// Post-handshake handshake messages (`NewSessionTicket`, `KeyUpdate`)
    /// are not supported: any Handshake-content record here is rejected.
    pub fn read_application_data(&mut self) -> Result<Bytes> {
        debug_assert!(self.buffer.is_empty());
        loop {
            let rec = record::read_record(&mut self.transport, self.keys.as_mut())?;
            match rec.content_type {
                ContentType::application_data => return Ok(rec.data),
                ContentType::change_cipher_spec => continue,
                ContentType::alert => match parse_alert(&rec.data)? {
                    a if a.description.to_u8() == AlertDescription::close_notify.to_u8() => {
                        return Err(TlsError::CloseNotify)
                    }
                    a if a.level.to_u8() == AlertLevel::fatal.to_u8() => {
                        return Err(TlsError::PeerAlert(a.description))
                    }
                    _ => continue,
                },
                other => {
                    return Err(TlsError::UnexpectedMessage(format!(
                        "unexpected post-handshake record content type {:?}",
                        other
                    )))
                }
            }
        }
    }

    /// Reads the next raw, already-serialised handshake message, returning
    /// its wire bytes (for the transcript) and a cursor over just the body.
    pub fn read_message(&mut self) -> Result<(Bytes, crate::messages::HandshakeType, Bytes)> {
        loop {
            if self.buffer.len() >= 4 {
                let len = ((self.buffer[1] as usize) << 16)
                    | ((self.buffer[2] as usize) << 8)
                    | (self.buffer[3] as usize);
                if self.buffer.len() >= 4 + len {
                    let raw: Vec<u8> = self.buffer.drain(0..4 + len).collect();
                    let msg_type = crate::messages::HandshakeType::from_u8(raw[0]);
                    let body = Bytes::copy_from_slice(&raw[4..]);
                    return Ok((Bytes::from(raw), msg_type, body));
                }
            }

            let rec = record::read_record(&mut self.transport, self.keys.as_mut())?;
            match rec.content_type {
                ContentType::handshake => self.buffer.extend_from_slice(&rec.data),
                ContentType::change_cipher_spec => continue,
                ContentType::alert => match parse_alert(&rec.data)? {
                    a if a.description.to_u8() == AlertDescription::close_notify.to_u8() => {
                        return Err(TlsError::CloseNotify)
                    }
                    a if a.level.to_u8() == AlertLevel::fatal.to_u8() => {
                        return Err(TlsError::PeerAlert(a.description))
                    }
                    _ => continue,
                },
                ContentType::application_data => {
                    return Err(TlsError::UnexpectedMessage(
                        "application data received mid-handshake".into(),
                    ))
                }
                other => {
                    return Err(TlsError::UnexpectedMessage(format!(
                        "unexpected record content type {:?} during handshake",
                        other
                    )))
                }
            }
        }
    }
}

fn parse_alert(data: &Bytes) -> Result<Alert> {
    let mut cursor = Cursor::new(data.clone());
    Alert::parse(&mut cursor)
}

/// Writes whole handshake messages as one or more Handshake-content
/// records, and carries outbound, best-effort Alert emission.
pub struct HandshakeWriter<W: Write> {
    transport: W,
    keys: Option<DirectionKeys>,
}

impl<W: Write> HandshakeWriter<W> {
    pub fn new(transport: W) -> Self {
        HandshakeWriter {
            transport,
            keys: None,
        }
    }

    pub fn rekey(&mut self, keys: DirectionKeys) {
        self.keys = Some(keys);
    }

    pub fn transport_mut(&mut self) -> &mut W {
        &mut self.transport
    }

    /// Serialises and sends `message`, returning the bytes sent so the
    /// caller can feed them to the transcript.
    pub fn write_message(&mut self, message: &crate::messages::Handshake) -> Result<Bytes> {
        let raw = message.serialize();
        for chunk in raw.chunks(MAX_FRAGMENT_LEN) {
            let rec = Record {
                content_type: ContentType::handshake,
                data: Bytes::copy_from_slice(chunk),
            };
            record::write_record(&mut self.transport, self.keys.as_mut(), &rec)?;
        }
        Ok(Bytes::from(raw))
    }

    pub fn write_application_data(&mut self, data: &[u8]) -> Result<()> {
        for chunk in data.chunks(MAX_FRAGMENT_LEN) {
            let rec = Record {
                content_type: ContentType::application_data,
                data: Bytes::copy_from_slice(chunk),
            };
            record::write_record(&mut self.transport, self.keys.as_mut(), &rec)?;
        }
        Ok(())
    }

    /// Best-effort alert emission: failures to write are swallowed, as a
    /// broken transport at this point cannot be meaningfully reported.
    pub fn send_alert(&mut self, alert: Alert) {
        let mut body = Vec::new();
        alert.serialize(&mut body);
        let rec = Record {
            content_type: ContentType::alert,
            data: Bytes::from(body),
        };
        let _ = record::write_record(&mut self.transport, self.keys.as_mut(), &rec);
    }
}
