//! Connection status and terminal error codes.

use std::fmt;

/// Lifecycle states reported through the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsWsStatus {
    /// No transport open; the reconnect controller may re-arm a session.
    Disconnected,
    /// TCP/TLS connect and HTTP upgrade in flight.
    Connecting,
    /// Upgrade accepted; Hello/Identify exchange in flight.
    Authenticating,
    /// Identified by the server; requests may be sent.
    Connected,
    /// A terminal error occurred; see `last_error`.
    Error,
}

impl ObsWsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ObsWsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure kinds surfaced via `last_error` and the error callback.
///
/// Recoverable conditions (queue overflow, unparseable inbound JSON,
/// unsupported opcodes) are logged and discarded without producing one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsWsError {
    /// `begin` was called without a host.
    InvalidConfig,
    /// Connect failed, a write failed post-connect, or a request was
    /// attempted before the handshake completed.
    TransportUnavailable,
    /// Non-101 upgrade status, missing or mismatched accept key, handshake
    /// timeout, or a malformed Hello.
    HandshakeRejected,
    /// The server challenged but no usable password was configured.
    AuthenticationFailed,
    /// An unsupported protocol feature was encountered (fragmented frames).
    NotImplemented,
}

impl ObsWsError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::TransportUnavailable => "TRANSPORT_UNAVAILABLE",
            Self::HandshakeRejected => "HANDSHAKE_REJECTED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

impl fmt::Display for ObsWsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_strings() {
        assert_eq!(ObsWsStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(ObsWsStatus::Connected.to_string(), "connected");
        assert_eq!(ObsWsStatus::Error.to_string(), "error");
    }

    #[test]
    fn error_codes_are_machine_readable() {
        assert_eq!(ObsWsError::InvalidConfig.as_str(), "INVALID_CONFIG");
        assert_eq!(
            ObsWsError::AuthenticationFailed.to_string(),
            "AUTHENTICATION_FAILED"
        );
    }
}
