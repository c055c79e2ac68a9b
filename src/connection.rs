//! The connection façade: the byte-stream API exposed to callers, gating
//! I/O on handshake completion and holding the per-direction locks a
//! synchronous, multi-threaded read/write surface needs.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::alert::Alert;
use crate::error::{Result, TlsError};
use crate::handshake_layer::{HandshakeReader, HandshakeWriter};
use crate::record::DirectionKeys;
use crate::suite::CipherSuite;
use crate::transport::{ReadTransport, Transport, WriteTransport};

/// Information collected during the handshake and exposed to the caller
/// once it completes.
#[derive(Default, Clone)]
pub struct HandshakeSummary {
    pub cipher_suite: Option<CipherSuite>,
    /// DER-encoded, leaf first. Populated on the client side once the
    /// server's certificate chain has been accepted by `auth_callback`.
    pub peer_certificate_chain: Option<Vec<Vec<u8>>>,
}

struct HandshakeState {
    complete: bool,
    error: Option<TlsError>,
    summary: HandshakeSummary,
}

/// A TLS connection over transport `T`. `Read`/`Write`/`Close` may be
/// called concurrently from different threads; separate `read-direction`
/// and `write-direction` locks make that safe without letting a blocked
/// reader hold up a writer or vice versa.
pub struct Connection<T: Transport> {
    reader: Mutex<HandshakeReader<T::Reader>>,
    writer: Mutex<HandshakeWriter<T::Writer>>,
    handshake: Mutex<HandshakeState>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl<T: Transport> Connection<T> {
    pub(crate) fn from_transport(transport: T) -> Result<Self> {
        let local_addr = transport.local_addr()?;
        let peer_addr = transport.peer_addr()?;
        let (r, w) = transport.split()?;
        Ok(Connection {
            reader: Mutex::new(HandshakeReader::new(r)),
            writer: Mutex::new(HandshakeWriter::new(w)),
            handshake: Mutex::new(HandshakeState {
                complete: false,
                error: None,
                summary: HandshakeSummary::default(),
            }),
            local_addr,
            peer_addr,
        })
    }

    pub(crate) fn reader_lock(&self) -> std::sync::MutexGuard<'_, HandshakeReader<T::Reader>> {
        self.reader.lock().unwrap()
    }

    pub(crate) fn writer_lock(&self) -> std::sync::MutexGuard<'_, HandshakeWriter<T::Writer>> {
        self.writer.lock().unwrap()
    }

    pub(crate) fn rekey_read(&self, keys: DirectionKeys) {
        self.reader.lock().unwrap().rekey(keys);
    }

    pub(crate) fn rekey_write(&self, keys: DirectionKeys) {
        self.writer.lock().unwrap().rekey(keys);
    }

    /// Called by the drivers exactly once, holding both direction locks
    /// (inbound before outbound, to avoid deadlocking with a concurrent
    /// `Read`/`Write` caller that only takes one) for the duration of the
    /// handshake. `finish` does the actual I/O, then this records the
    /// outcome as the one-shot, sticky handshake state.
    pub(crate) fn run_handshake(
        &self,
        finish: impl FnOnce(
            &mut HandshakeReader<T::Reader>,
            &mut HandshakeWriter<T::Writer>,
        ) -> Result<HandshakeSummary>,
    ) -> Result<()> {
        let mut reader = self.reader.lock().unwrap();
        let mut writer = self.writer.lock().unwrap();

        let mut hs = self.handshake.lock().unwrap();
        if hs.complete {
            return Ok(());
        }
        if let Some(e) = &hs.error {
            return Err(e.clone());
        }

        match finish(&mut reader, &mut writer) {
            Ok(summary) => {
                hs.complete = true;
                hs.summary = summary;
                Ok(())
            }
            Err(err) => {
                if let Some(desc) = err.alert_description() {
                    writer.send_alert(Alert::fatal(desc));
                }
                if err.is_sticky() {
                    hs.error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    fn ensure_handshake_complete(&self) -> Result<()> {
        let hs = self.handshake.lock().unwrap();
        if let Some(e) = &hs.error {
            return Err(e.clone());
        }
        if !hs.complete {
            return Err(TlsError::InternalError(
                "connection used before handshake completed".into(),
            ));
        }
        Ok(())
    }

    pub fn handshake_summary(&self) -> HandshakeSummary {
        self.handshake.lock().unwrap().summary.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn set_read_timeout(&self, dur: Option<Duration>) -> Result<()> {
        Ok(self.reader.lock().unwrap().transport_mut().set_read_timeout(dur)?)
    }

    pub fn set_write_timeout(&self, dur: Option<Duration>) -> Result<()> {
        Ok(self.writer.lock().unwrap().transport_mut().set_write_timeout(dur)?)
    }

    /// Sets both directions' timeouts at once (the `SetDeadline` of §6,
    /// where this crate's blocking transport expresses a deadline as a
    /// timeout rather than an absolute instant -- see `transport.rs`).
    pub fn set_timeout(&self, dur: Option<Duration>) -> Result<()> {
        self.set_read_timeout(dur)?;
        self.set_write_timeout(dur)
    }

    /// Blocks until at least one byte is available, an error occurs, or the
    /// peer sends `close_notify` (reported as `Ok(0)`, matching a
    /// `std::io::Read` EOF convention).
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_handshake_complete()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let mut reader = self.reader.lock().unwrap();
        match reader.read_into(buf) {
            Ok(n) => Ok(n),
            Err(TlsError::CloseNotify) => Ok(0),
            Err(err) => {
                if err.is_sticky() {
                    self.handshake.lock().unwrap().error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    /// Fragments `buf` into at most `MAX_FRAGMENT_LEN`-sized records and
    /// writes all of it, or fails.
    pub fn write(&self, buf: &[u8]) -> Result<()> {
        self.ensure_handshake_complete()?;
        let mut writer = self.writer.lock().unwrap();
        match writer.write_application_data(buf) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.is_sticky() {
                    self.handshake.lock().unwrap().error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    /// Best-effort `close_notify`, then shuts down the transport.
    pub fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.send_alert(Alert::close_notify());
        let _ = writer.transport_mut().shutdown();
        Ok(())
    }
}
