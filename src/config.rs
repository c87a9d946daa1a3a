//! Client configuration and host callbacks.
//!
//! A `ClientConfig` is handed to [`ObsWsClient::begin`](crate::ObsWsClient::begin)
//! and is immutable for the lifetime of the session; the reconnect controller
//! reuses it verbatim for every retry.

use crate::protocol::ObsEvent;
use crate::status::{ObsWsError, ObsWsStatus};
use std::fmt;

/// Invoked once per dequeued server event or request response.
pub type EventCallback = Box<dyn FnMut(&ObsEvent) + Send>;
/// Invoked on every status transition (at most once per distinct change).
pub type StatusCallback = Box<dyn FnMut(ObsWsStatus) + Send>;
/// Invoked when a terminal error is recorded.
pub type ErrorCallback = Box<dyn FnMut(ObsWsError) + Send>;
/// Invoked with a single ASCII diagnostic line.
pub type LogCallback = Box<dyn FnMut(&str) + Send>;

/// Default obs-websocket port.
pub const DEFAULT_PORT: u16 = 4455;
/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5000;
/// Default time allowed for upgrade + Hello/Identify before giving up.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
/// Default `eventSubscriptions` mask sent in Identify.
pub const DEFAULT_EVENT_SUBSCRIPTIONS: u64 = 0xFFFF_FFFF;

/// Connection parameters and callback slots for one OBS session.
pub struct ClientConfig {
    /// Host name or IP address of the OBS instance. Required.
    pub host: String,
    /// TCP port (default 4455).
    pub port: u16,
    /// Use a TLS transport with peer verification disabled.
    pub use_tls: bool,
    /// Password for the obs-websocket challenge, if the server requires one.
    pub password: Option<String>,
    /// Re-arm the session automatically after a disconnect or error.
    pub auto_reconnect: bool,
    /// Minimum delay between reconnect attempts.
    pub reconnect_interval_ms: u64,
    /// Handshake deadline measured from the upgrade request; 0 disables.
    pub handshake_timeout_ms: u64,
    /// 64-bit event-subscription mask sent in Identify.
    pub event_subscriptions: u64,
    pub(crate) on_event: Option<EventCallback>,
    pub(crate) on_status: Option<StatusCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_log: Option<LogCallback>,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            use_tls: false,
            password: None,
            auto_reconnect: true,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            event_subscriptions: DEFAULT_EVENT_SUBSCRIPTIONS,
            on_event: None,
            on_status: None,
            on_error: None,
            on_log: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn reconnect_interval_ms(mut self, interval: u64) -> Self {
        self.reconnect_interval_ms = interval;
        self
    }

    pub fn handshake_timeout_ms(mut self, timeout: u64) -> Self {
        self.handshake_timeout_ms = timeout;
        self
    }

    pub fn event_subscriptions(mut self, mask: u64) -> Self {
        self.event_subscriptions = mask;
        self
    }

    pub fn on_event(mut self, callback: impl FnMut(&ObsEvent) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(callback));
        self
    }

    pub fn on_status(mut self, callback: impl FnMut(ObsWsStatus) + Send + 'static) -> Self {
        self.on_status = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(ObsWsError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_log(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_log = Some(Box::new(callback));
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("reconnect_interval_ms", &self.reconnect_interval_ms)
            .field("handshake_timeout_ms", &self.handshake_timeout_ms)
            .field("event_subscriptions", &self.event_subscriptions)
            .finish_non_exhaustive()
    }
}
