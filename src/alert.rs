//! TLS alert protocol messages: level, description, and the two-byte wire
//! struct, built from this crate's own `tls_enum_u8!`/`tls_struct!` macros.

use crate::error::TlsError;
use crate::{tls_enum_u8, tls_struct};

tls_enum_u8!(AlertLevel =>
    warning(1),
    fatal(2)
);

tls_enum_u8!(AlertDescription =>
    close_notify(0),
    unexpected_message(10),
    bad_record_mac(20),
    record_overflow(22),
    handshake_failure(40),
    bad_certificate(42),
    unsupported_certificate(43),
    certificate_revoked(44),
    certificate_expired(45),
    certificate_unknown(46),
    illegal_parameter(47),
    decode_error(50),
    decrypt_error(51),
    protocol_version(70),
    internal_error(80),
    missing_extension(109),
    unsupported_extension(110),
    no_application_protocol(120)
);

tls_struct!(Alert => {
    level: AlertLevel,
    description: AlertDescription,
});

impl Alert {
    pub fn fatal(description: AlertDescription) -> Self {
        Alert {
            level: AlertLevel::fatal,
            description,
        }
    }

    pub fn close_notify() -> Self {
        Alert {
            level: AlertLevel::warning,
            description: AlertDescription::close_notify,
        }
    }
}

impl From<&TlsError> for Alert {
    fn from(err: &TlsError) -> Self {
        match err.alert_description() {
            Some(d) => Alert::fatal(d),
            None => Alert::fatal(AlertDescription::internal_error),
        }
    }
}
