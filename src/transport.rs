//! Byte transports behind the WebSocket connection.
//!
//! The client owns exactly one [`Transport`] between `begin` and `close` and
//! drives it from a single task. Reads are non-blocking so `poll` stays
//! responsive; `connect` and writes may block briefly.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// A connect/read/write/close byte sink.
///
/// `read` must never block: it returns `Ok(0)` when nothing is pending. On
/// end-of-stream or a fatal I/O error the implementation marks itself
/// disconnected so that `is_connected` reports the loss on the next poll.
pub trait Transport: Send {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    fn is_connected(&self) -> bool;

    /// Read whatever is available without blocking. `Ok(0)` means no data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Tear the connection down. Idempotent.
    fn shutdown(&mut self);
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport not connected")
}

/// Drive a blocking-style write over a non-blocking stream.
fn write_all_retrying<W: Write>(writer: &mut W, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Plain TCP
// ─────────────────────────────────────────────────────────────────

/// Plain TCP transport.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.shutdown();
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        match stream.read(buf) {
            // Ok(0) from a readable socket is end-of-stream.
            Ok(0) => {
                self.stream = None;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(0)
            }
            Err(e) => {
                self.stream = None;
                Err(e)
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        write_all_retrying(stream, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// TLS (verification disabled)
// ─────────────────────────────────────────────────────────────────

/// TLS transport that accepts any peer certificate.
///
/// obs-websocket instances behind TLS usually sit on a LAN with self-signed
/// certificates, so this transport disables certificate and hostname
/// verification. Do not point it at untrusted networks.
pub struct TlsTransport {
    stream: Option<native_tls::TlsStream<TcpStream>>,
}

impl TlsTransport {
    /// Build the accept-any-peer transport. The name carries the warning.
    pub fn insecure() -> Self {
        Self { stream: None }
    }
}

impl Transport for TlsTransport {
    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.shutdown();

        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| io::Error::other(format!("tls connector: {e}")))?;

        let tcp = TcpStream::connect((host, port))?;
        tcp.set_nodelay(true)?;

        // Handshake on the blocking socket, then switch to non-blocking reads.
        let stream = connector
            .connect(host, tcp)
            .map_err(|e| io::Error::other(format!("tls handshake: {e}")))?;
        stream.get_ref().set_nonblocking(true)?;

        self.stream = Some(stream);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        match stream.read(buf) {
            Ok(0) => {
                self.stream = None;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(0)
            }
            Err(e) => {
                self.stream = None;
                Err(e)
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        write_all_retrying(stream, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown();
        }
    }
}

impl std::fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsTransport")
            .field("connected", &self.stream.is_some())
            .finish()
    }
}
