//! OBS Studio WebSocket client
//!
//! Single-connection client for the obs-websocket 5.x protocol (built into
//! OBS 28+). The client is poll-driven: `begin` opens the transport and sends
//! the HTTP upgrade, and repeated `poll` calls drive the handshake, decode
//! incoming frames, deliver server events through the configured callbacks,
//! and re-establish lost connections.
//!
//! ```no_run
//! use obsws::{ClientConfig, ObsWsClient};
//!
//! let mut client = ObsWsClient::new();
//! let config = ClientConfig::new("127.0.0.1")
//!     .password("hunter2")
//!     .on_event(|event| println!("{}: {}", event.id, event.payload));
//! client.begin(config);
//!
//! loop {
//!     client.poll();
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod frame;
pub mod protocol;
pub mod queue;
pub mod requests;
pub mod status;
pub mod transport;
pub mod upgrade;

pub use client::ObsWsClient;
pub use config::ClientConfig;
pub use protocol::ObsEvent;
pub use requests::Request;
pub use status::{ObsWsError, ObsWsStatus};
pub use transport::{TcpTransport, TlsTransport, Transport};
