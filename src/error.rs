//! Error taxonomy and its mapping onto TLS alert descriptions.

use crate::alert::AlertDescription;

pub type Result<T> = std::result::Result<T, TlsError>;

/// Every way the handshake or record layer can fail.
///
/// During the handshake any of these is terminal: the first one is stored on
/// the connection and re-raised by every subsequent operation (see
/// `Connection`). After the handshake, only `CloseNotify` and peer-sent
/// fatal alerts end the connection; see `record.rs` / `connection.rs`.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("malformed wire encoding: {0}")]
    DecodeError(String),

    #[error("unexpected handshake message: {0}")]
    UnexpectedMessage(String),

    #[error("required extension missing: {0}")]
    MissingExtension(String),

    #[error("no common cipher suite / group with peer")]
    HandshakeFailure,

    #[error("certificate rejected: {0}")]
    BadCertificate(String),

    #[error("signature verification failed")]
    DecryptError,

    #[error("AEAD open failed or Finished verify_data mismatch")]
    BadRecordMAC,

    #[error("record or fragment exceeds the maximum allowed length")]
    RecordOverflow,

    #[error("internal invariant violated: {0}")]
    InternalError(String),

    #[error("peer sent close_notify")]
    CloseNotify,

    #[error("peer sent fatal alert: {0:?}")]
    PeerAlert(AlertDescription),

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for TlsError {
    fn clone(&self) -> Self {
        match self {
            TlsError::DecodeError(s) => TlsError::DecodeError(s.clone()),
            TlsError::UnexpectedMessage(s) => TlsError::UnexpectedMessage(s.clone()),
            TlsError::MissingExtension(s) => TlsError::MissingExtension(s.clone()),
            TlsError::HandshakeFailure => TlsError::HandshakeFailure,
            TlsError::BadCertificate(s) => TlsError::BadCertificate(s.clone()),
            TlsError::DecryptError => TlsError::DecryptError,
            TlsError::BadRecordMAC => TlsError::BadRecordMAC,
            TlsError::RecordOverflow => TlsError::RecordOverflow,
            TlsError::InternalError(s) => TlsError::InternalError(s.clone()),
            TlsError::CloseNotify => TlsError::CloseNotify,
            TlsError::PeerAlert(d) => TlsError::PeerAlert(*d),
            TlsError::Io(e) => TlsError::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl TlsError {
    /// The alert description to send when this error is fatal and the core
    /// can still write to the peer. `None` for errors that never produce an
    /// outbound alert (e.g. one already describing an inbound alert, or a
    /// transport failure where writing would just fail again).
    pub fn alert_description(&self) -> Option<AlertDescription> {
        Some(match self {
            TlsError::DecodeError(_) => AlertDescription::decode_error,
            TlsError::UnexpectedMessage(_) => AlertDescription::unexpected_message,
            TlsError::MissingExtension(_) => AlertDescription::missing_extension,
            TlsError::HandshakeFailure => AlertDescription::handshake_failure,
            TlsError::BadCertificate(_) => AlertDescription::bad_certificate,
            TlsError::DecryptError => AlertDescription::decrypt_error,
            TlsError::BadRecordMAC => AlertDescription::bad_record_mac,
            TlsError::RecordOverflow => AlertDescription::record_overflow,
            TlsError::InternalError(_) => AlertDescription::internal_error,
            TlsError::CloseNotify => AlertDescription::close_notify,
            TlsError::PeerAlert(_) | TlsError::Io(_) => return None,
        })
    }

    /// Whether this error, once stored, should be re-raised verbatim by
    /// subsequent operations rather than treated as a one-shot I/O hiccup.
    pub fn is_sticky(&self) -> bool {
        !matches!(self, TlsError::Io(_))
    }
}
