//! A from-scratch TLS 1.3 (draft-era) handshake and record layer: mutual
//! derivation of session keys over an untrusted byte stream, authentication
//! of the server by certificate, and framing of application data inside
//! authenticated, encrypted records.
//!
//! The crate is organised bottom-up, matching the dependency order of the
//! protocol itself:
//!
//! - [`record`] frames the raw transport into typed records and applies AEAD.
//! - [`handshake_layer`] reassembles handshake messages on top of the record
//!   layer.
//! - [`extensions`] and [`messages`] are the wire grammar of Hello-shaped
//!   messages and their bodies.
//! - [`transcript`] and [`key_schedule`] are the key schedule: transcript
//!   hashing and HKDF-based secret derivation.
//! - [`client`] and [`server`] are the two handshake drivers.
//! - [`connection`] is the byte-stream façade callers actually use.
//!
//! Raw cryptographic primitives, certificate/PKI trust evaluation, and the
//! transport itself are injected through [`suite::CryptoProvider`],
//! [`config::AuthCallback`], and [`transport::Transport`] respectively; see
//! each module's docs. A concrete primitive suite for testing lives in
//! [`reference`], gated behind the `reference-suite` feature.

pub mod alert;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod extensions;
pub mod handshake_layer;
pub mod key_schedule;
mod macros;
pub mod messages;
pub mod parsing;
pub mod record;
pub mod server;
pub mod suite;
pub mod transcript;
pub mod transport;

#[cfg(feature = "reference-suite")]
pub mod reference;

use crate::config::{ClientConfig, ServerConfig};
use crate::connection::Connection;
use crate::error::Result;
use crate::transport::Transport;

/// Private-use extension number identifying the draft of this
/// implementation on the wire; not an IANA-assigned number.
pub const DRAFT_VERSION: u16 = 0x7f1c;

/// Connects to `transport` as a client, running the handshake to completion
/// before returning. The idempotent handshake trigger is
/// `client::handshake`/`server::handshake` themselves, called again
/// internally; this free function is the common case of "connect and
/// immediately handshake".
pub fn connect<T: Transport>(transport: T, config: &ClientConfig) -> Result<Connection<T>> {
    let conn = Connection::from_transport(transport)?;
    client::handshake(&conn, config)?;
    Ok(conn)
}

/// Accepts a connection from `transport` as a server, running the handshake
/// to completion before returning.
pub fn accept<T: Transport>(transport: T, config: &ServerConfig) -> Result<Connection<T>> {
    let conn = Connection::from_transport(transport)?;
    server::handshake(&conn, config)?;
    Ok(conn)
}
