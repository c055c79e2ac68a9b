//! The byte-stream transport contract this crate is built against, and a
//! `std::net::TcpStream` implementation of it.
//!
//! Splits a stream into independently owned, independently lockable read and
//! write halves via `try_clone` plus per-direction `set_read_timeout`/
//! `set_write_timeout`: exactly what the per-direction lock model needs (a
//! blocked reader must never hold up a writer).

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

pub trait ReadTransport: Read + Send {
    fn set_read_timeout(&mut self, dur: Option<Duration>) -> std::io::Result<()>;
}

pub trait WriteTransport: Write + Send {
    fn set_write_timeout(&mut self, dur: Option<Duration>) -> std::io::Result<()>;

    /// Closes the transport after a best-effort `close_notify` has been
    /// written. For a cloned `TcpStream` pair, shutting down one half shuts
    /// down the shared underlying socket for both.
    fn shutdown(&mut self) -> std::io::Result<()>;
}

/// A bidirectional octet stream with addresses and per-direction deadlines,
/// splittable into independent read/write halves.
pub trait Transport: Send {
    type Reader: ReadTransport;
    type Writer: WriteTransport;

    fn split(self) -> Result<(Self::Reader, Self::Writer)>;
    fn local_addr(&self) -> Result<SocketAddr>;
    fn peer_addr(&self) -> Result<SocketAddr>;
}

impl ReadTransport for TcpStream {
    fn set_read_timeout(&mut self, dur: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }
}

impl WriteTransport for TcpStream {
    fn set_write_timeout(&mut self, dur: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_write_timeout(self, dur)
    }

    fn shutdown(&mut self) -> std::io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

impl Transport for TcpStream {
    type Reader = TcpStream;
    type Writer = TcpStream;

    fn split(self) -> Result<(TcpStream, TcpStream)> {
        let writer = self.try_clone()?;
        Ok((self, writer))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(TcpStream::local_addr(self)?)
    }

    fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(TcpStream::peer_addr(self)?)
    }
}
