//! Session facade: connection lifecycle, handshake state machine, polling.
//!
//! `begin` arms a session and returns without waiting for the handshake; the
//! host then calls `poll` from a single task to drive the upgrade, the
//! Hello/Identify exchange, frame decoding, event delivery, and reconnects.
//! Callbacks run synchronously from inside these calls and must not invoke
//! the client again.

use crate::auth;
use crate::config::ClientConfig;
use crate::frame::{self, Decoded, Opcode};
use crate::protocol::{op, AuthChallenge, Hello, ObsEvent, ServerMessage};
use crate::queue::EventQueue;
use crate::requests::Request;
use crate::status::{ObsWsError, ObsWsStatus};
use crate::transport::{TcpTransport, TlsTransport, Transport};
use crate::upgrade::{self, UpgradeOutcome, MAX_HANDSHAKE_HEADER};
use anyhow::{Context, Result};
use rand::Rng;
use serde_json::{json, Value};
use std::io;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    Idle,
    AwaitUpgrade,
    AwaitHello,
    AwaitIdentifyResponse,
    Established,
}

/// Single-connection OBS WebSocket client.
pub struct ObsWsClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    /// An injected transport is never replaced by the TLS/TCP selection.
    transport_injected: bool,
    status: ObsWsStatus,
    last_error: Option<ObsWsError>,
    handshake: HandshakeState,
    handshake_started: Option<Instant>,
    sec_websocket_key: String,
    handshake_buffer: Vec<u8>,
    rx_buffer: Vec<u8>,
    queue: EventQueue,
    request_counter: u32,
    last_state_change: Option<Instant>,
    last_reconnect_attempt: Option<Instant>,
}

impl ObsWsClient {
    pub fn new() -> Self {
        let mut client = Self::with_transport(Box::new(TcpTransport::new()));
        client.transport_injected = false;
        client
    }

    /// Build a client around a caller-supplied transport. The transport is
    /// kept across reconnects instead of being rebuilt from the TLS flag.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            config: ClientConfig::default(),
            transport,
            transport_injected: true,
            status: ObsWsStatus::Disconnected,
            last_error: None,
            handshake: HandshakeState::Idle,
            handshake_started: None,
            sec_websocket_key: String::new(),
            handshake_buffer: Vec::new(),
            rx_buffer: Vec::new(),
            queue: EventQueue::new(),
            request_counter: 1,
            last_state_change: None,
            last_reconnect_attempt: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Public operations
    // ─────────────────────────────────────────────────────────────────

    /// Tear down any prior session and arm a new one.
    ///
    /// Returns once the transport is open and the upgrade request has been
    /// written; the handshake itself completes across subsequent `poll`
    /// calls. Returns false (with `last_error` set) when the configuration
    /// is invalid or the transport cannot connect.
    pub fn begin(&mut self, config: ClientConfig) -> bool {
        self.config = config;
        self.start_session()
    }

    /// Drive the session: read available bytes, advance the handshake or the
    /// frame decoder, enforce the handshake deadline, attempt reconnects,
    /// and deliver queued events. Non-blocking and idempotent when nothing
    /// is pending.
    pub fn poll(&mut self) {
        let now = Instant::now();

        if matches!(self.status, ObsWsStatus::Error | ObsWsStatus::Disconnected) {
            self.maybe_reconnect(now);
            return;
        }

        if !self.transport.is_connected() {
            self.emit_log("transport disconnected");
            self.transport.shutdown();
            self.handshake = HandshakeState::Idle;
            self.handshake_buffer.clear();
            self.rx_buffer.clear();
            self.change_status(ObsWsStatus::Disconnected);
        } else {
            self.pump_receive();
        }

        self.check_handshake_deadline(now);
        self.drain_queue();
    }

    /// Stop the transport, drop queued events, and reset to Disconnected.
    /// Calling `close` on a closed client changes nothing.
    pub fn close(&mut self) {
        self.handshake = HandshakeState::Idle;
        self.handshake_started = None;
        self.handshake_buffer.clear();
        self.rx_buffer.clear();

        self.transport.shutdown();
        self.queue.clear();

        if self.status != ObsWsStatus::Disconnected {
            self.change_status(ObsWsStatus::Disconnected);
        }

        self.last_error = None;
        self.emit_log("connection closed");
    }

    /// Send an `op=6` request. `payload` is a JSON object for `requestData`,
    /// or empty to omit it. Returns false when the session is not
    /// established, the payload is not valid JSON, or the write fails.
    pub fn send_request(&mut self, request_type: &str, payload: &str) -> bool {
        if request_type.is_empty() {
            self.emit_log("send_request requires a request type");
            return false;
        }

        if self.handshake != HandshakeState::Established {
            self.emit_log("send_request called before handshake completion");
            self.last_error = Some(ObsWsError::TransportUnavailable);
            return false;
        }

        let message = match self.build_request(request_type, payload) {
            Ok(message) => message,
            Err(err) => {
                self.emit_log(&format!("{err:#}"));
                return false;
            }
        };

        if !self.send_text(&message) {
            self.emit_log("failed to send request");
            self.last_error = Some(ObsWsError::TransportUnavailable);
            return false;
        }

        true
    }

    /// Submit a prebuilt [`Request`].
    pub fn submit(&mut self, request: &Request) -> bool {
        let payload = request
            .data
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        self.send_request(request.request_type, &payload)
    }

    pub fn status(&self) -> ObsWsStatus {
        self.status
    }

    /// Terminal error recorded since the most recent successful `begin`, if
    /// any.
    pub fn last_error(&self) -> Option<ObsWsError> {
        self.last_error
    }

    pub fn is_connected(&self) -> bool {
        self.status == ObsWsStatus::Connected
    }

    /// Instant of the most recent status transition, if any.
    pub fn last_state_change(&self) -> Option<Instant> {
        self.last_state_change
    }

    // ─────────────────────────────────────────────────────────────────
    // Session setup and reconnect
    // ─────────────────────────────────────────────────────────────────

    fn start_session(&mut self) -> bool {
        self.close();
        self.last_error = None;

        if self.config.host.is_empty() {
            self.emit_log("invalid configuration: host not set");
            self.fail(ObsWsError::InvalidConfig);
            return false;
        }

        self.change_status(ObsWsStatus::Connecting);

        if !self.connect_transport() {
            self.fail(ObsWsError::TransportUnavailable);
            return false;
        }

        self.last_reconnect_attempt = Some(Instant::now());
        self.emit_log("websocket connection initiated");
        true
    }

    fn connect_transport(&mut self) -> bool {
        self.transport.shutdown();

        if !self.transport_injected {
            self.transport = if self.config.use_tls {
                Box::new(TlsTransport::insecure())
            } else {
                Box::new(TcpTransport::new())
            };
        }

        let host = self.config.host.clone();
        if let Err(err) = self.transport.connect(&host, self.config.port) {
            self.emit_log(&format!("failed to establish connection: {err}"));
            return false;
        }

        if let Err(err) = self.send_upgrade_request() {
            self.emit_log(&format!("failed to send upgrade request: {err}"));
            self.transport.shutdown();
            return false;
        }

        self.handshake = HandshakeState::AwaitUpgrade;
        self.handshake_started = Some(Instant::now());
        self.handshake_buffer.clear();
        self.rx_buffer.clear();
        true
    }

    fn send_upgrade_request(&mut self) -> io::Result<()> {
        self.sec_websocket_key = upgrade::generate_websocket_key();
        let request = upgrade::build_upgrade_request(
            &self.config.host,
            self.config.port,
            &self.sec_websocket_key,
        );
        self.transport.write_all(request.as_bytes())?;
        self.transport.flush()
    }

    fn maybe_reconnect(&mut self, now: Instant) {
        if !self.config.auto_reconnect || self.config.host.is_empty() {
            return;
        }

        let interval = Duration::from_millis(self.config.reconnect_interval_ms);
        let due = match self.last_reconnect_attempt {
            Some(last) => now.duration_since(last) >= interval,
            None => true,
        };

        if due {
            self.last_reconnect_attempt = Some(now);
            self.emit_log("auto-reconnect attempt");
            self.start_session();
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Receive path
    // ─────────────────────────────────────────────────────────────────

    fn pump_receive(&mut self) {
        let mut chunk = [0u8; 512];
        loop {
            let read = match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    self.emit_log(&format!("transport read error: {err}"));
                    break;
                }
            };

            if self.handshake == HandshakeState::AwaitUpgrade {
                self.handshake_buffer.extend_from_slice(&chunk[..read]);
                if self.handshake_buffer.len() > MAX_HANDSHAKE_HEADER {
                    self.emit_log("handshake header too large");
                    self.fail(ObsWsError::HandshakeRejected);
                    return;
                }
            } else {
                self.rx_buffer.extend_from_slice(&chunk[..read]);
            }
        }

        if self.handshake == HandshakeState::AwaitUpgrade {
            self.process_upgrade();
        }

        if !matches!(
            self.handshake,
            HandshakeState::AwaitUpgrade | HandshakeState::Idle
        ) && !self.rx_buffer.is_empty()
        {
            self.process_frames();
        }
    }

    fn process_upgrade(&mut self) {
        let expected = upgrade::compute_accept_key(&self.sec_websocket_key);
        match upgrade::parse_upgrade_response(&self.handshake_buffer, &expected) {
            UpgradeOutcome::Incomplete => {}
            UpgradeOutcome::Rejected(reason) => {
                self.emit_log(reason);
                self.fail(ObsWsError::HandshakeRejected);
            }
            UpgradeOutcome::Accepted { trailing } => {
                // Bytes past the header terminator already belong to the
                // WebSocket stream.
                self.handshake_buffer.clear();
                let mut buffered = trailing;
                buffered.append(&mut self.rx_buffer);
                self.rx_buffer = buffered;

                self.handshake = HandshakeState::AwaitHello;
                self.emit_log("websocket upgrade acknowledged");
                self.change_status(ObsWsStatus::Authenticating);
            }
        }
    }

    fn process_frames(&mut self) {
        loop {
            match frame::decode_frame(&self.rx_buffer) {
                Decoded::Incomplete => break,
                Decoded::Fragmented => {
                    self.emit_log("fragmented frames are not supported");
                    self.fail(ObsWsError::NotImplemented);
                    return;
                }
                Decoded::Frame {
                    opcode,
                    payload,
                    consumed,
                } => {
                    self.rx_buffer.drain(..consumed);
                    self.handle_frame(opcode, payload);
                    if matches!(self.status, ObsWsStatus::Error | ObsWsStatus::Disconnected) {
                        return;
                    }
                }
            }
        }
    }

    fn handle_frame(&mut self, opcode: Opcode, payload: Vec<u8>) {
        match opcode {
            Opcode::Text => self.handle_text(&payload),
            Opcode::Close => {
                self.emit_log("close frame received from server");
                self.send_frame(Opcode::Close, &[]);
                self.transport.shutdown();
                self.handshake = HandshakeState::Idle;
                self.handshake_buffer.clear();
                self.rx_buffer.clear();
                self.change_status(ObsWsStatus::Disconnected);
            }
            Opcode::Ping => {
                if !self.send_frame(Opcode::Pong, &payload) {
                    self.emit_log("failed to send pong response");
                }
            }
            Opcode::Pong => {}
            _ => self.emit_log("ignoring unsupported frame opcode"),
        }
    }

    fn handle_text(&mut self, payload: &[u8]) {
        let message: ServerMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(_) => {
                self.emit_log("failed to parse incoming JSON");
                return;
            }
        };

        match message.op {
            op::HELLO => self.handle_hello(message.d),
            op::IDENTIFIED => self.handle_identified(),
            op::EVENT => self.handle_event(&message.d),
            op::REQUEST_RESPONSE => self.handle_request_response(&message.d),
            _ => self.emit_log("ignoring unsupported protocol opcode"),
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Handshake state machine
    // ─────────────────────────────────────────────────────────────────

    fn handle_hello(&mut self, data: Value) {
        if self.handshake != HandshakeState::AwaitHello {
            return;
        }

        let hello: Hello = match serde_json::from_value(data) {
            Ok(hello) => hello,
            Err(_) => {
                self.emit_log("hello message missing rpcVersion");
                self.fail(ObsWsError::HandshakeRejected);
                return;
            }
        };

        match self.send_identify(hello.rpc_version, hello.authentication.as_ref()) {
            Ok(()) => self.handshake = HandshakeState::AwaitIdentifyResponse,
            Err(error) => self.fail(error),
        }
    }

    fn send_identify(
        &mut self,
        rpc_version: u32,
        challenge: Option<&AuthChallenge>,
    ) -> std::result::Result<(), ObsWsError> {
        let mut d = json!({
            "rpcVersion": rpc_version,
            "eventSubscriptions": self.config.event_subscriptions,
        });

        if let Some(auth_challenge) = challenge {
            let password = self.config.password.clone().unwrap_or_default();
            if password.is_empty() {
                self.emit_log("server requires authentication but no password was provided");
                return Err(ObsWsError::AuthenticationFailed);
            }
            if auth_challenge.challenge.is_empty() || auth_challenge.salt.is_empty() {
                self.emit_log("authentication challenge or salt is empty");
                return Err(ObsWsError::AuthenticationFailed);
            }

            d["authentication"] = Value::String(auth::generate_auth_string(
                &password,
                &auth_challenge.challenge,
                &auth_challenge.salt,
            ));
        }

        let message = json!({ "op": op::IDENTIFY, "d": d }).to_string();
        if !self.send_text(&message) {
            self.emit_log("failed to send identify message");
            return Err(ObsWsError::TransportUnavailable);
        }
        Ok(())
    }

    fn handle_identified(&mut self) {
        if self.handshake != HandshakeState::AwaitIdentifyResponse {
            return;
        }

        self.handshake = HandshakeState::Established;
        self.change_status(ObsWsStatus::Connected);
        self.emit_log("handshake complete");
    }

    fn check_handshake_deadline(&mut self, now: Instant) {
        if !matches!(
            self.status,
            ObsWsStatus::Connecting | ObsWsStatus::Authenticating
        ) || self.config.handshake_timeout_ms == 0
        {
            return;
        }

        let Some(started) = self.handshake_started else {
            return;
        };

        if now.duration_since(started) >= Duration::from_millis(self.config.handshake_timeout_ms) {
            self.emit_log("handshake timeout");
            self.fail(ObsWsError::HandshakeRejected);
            self.change_status(ObsWsStatus::Disconnected);
            // Stamping here delays the next reconnect by a full interval.
            self.last_reconnect_attempt = Some(now);
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Events and requests
    // ─────────────────────────────────────────────────────────────────

    fn handle_event(&mut self, data: &Value) {
        let id = data
            .get("eventType")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        let payload = data
            .get("eventData")
            .map(Value::to_string)
            .unwrap_or_default();
        self.enqueue_event(id, payload);
    }

    fn handle_request_response(&mut self, data: &Value) {
        let id = data
            .get("requestId")
            .and_then(Value::as_str)
            .unwrap_or("unknown-request")
            .to_owned();
        self.enqueue_event(id, data.to_string());
    }

    fn enqueue_event(&mut self, id: String, payload: String) {
        if !self.queue.push(ObsEvent { id, payload }) {
            self.emit_log("event queue full, dropping message");
        }
    }

    fn drain_queue(&mut self) {
        while let Some(event) = self.queue.pop() {
            if let Some(callback) = self.config.on_event.as_mut() {
                callback(&event);
            }
        }
    }

    fn build_request(&mut self, request_type: &str, payload: &str) -> Result<String> {
        let request_id = self.next_request_id();
        let mut d = json!({ "requestType": request_type, "requestId": request_id });

        if !payload.is_empty() {
            let data: Value =
                serde_json::from_str(payload).context("request payload is not valid JSON")?;
            d["requestData"] = data;
        }

        Ok(json!({ "op": op::REQUEST, "d": d }).to_string())
    }

    fn next_request_id(&mut self) -> String {
        let id = self.request_counter;
        self.request_counter = self.request_counter.wrapping_add(1);
        id.to_string()
    }

    // ─────────────────────────────────────────────────────────────────
    // Frame output and state transitions
    // ─────────────────────────────────────────────────────────────────

    fn send_text(&mut self, text: &str) -> bool {
        self.send_frame(Opcode::Text, text.as_bytes())
    }

    fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> bool {
        if !self.transport.is_connected() {
            return false;
        }

        let mut mask_key = [0u8; 4];
        rand::rng().fill(&mut mask_key);
        let encoded = frame::encode_frame(opcode, payload, mask_key);

        if let Err(err) = self.transport.write_all(&encoded) {
            self.emit_log(&format!("transport write error: {err}"));
            return false;
        }
        if let Err(err) = self.transport.flush() {
            self.emit_log(&format!("transport flush error: {err}"));
            return false;
        }
        true
    }

    /// Terminal failure path: record the error, notify, and tear the session
    /// down so the reconnect controller can take over.
    fn fail(&mut self, error: ObsWsError) {
        self.last_error = Some(error);
        if let Some(callback) = self.config.on_error.as_mut() {
            callback(error);
        }
        self.change_status(ObsWsStatus::Error);

        self.transport.shutdown();
        self.handshake = HandshakeState::Idle;
        self.handshake_started = None;
        self.handshake_buffer.clear();
        self.rx_buffer.clear();
    }

    fn change_status(&mut self, next: ObsWsStatus) {
        if self.status == next {
            return;
        }

        self.status = next;
        self.last_state_change = Some(Instant::now());

        if let Some(callback) = self.config.on_status.as_mut() {
            callback(next);
        }
    }

    fn emit_log(&mut self, message: &str) {
        log::debug!("{message}");
        if let Some(callback) = self.config.on_log.as_mut() {
            callback(message);
        }
    }
}

impl Default for ObsWsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport that refuses to connect.
    struct DeadTransport;

    impl Transport for DeadTransport {
        fn connect(&mut self, _host: &str, _port: u16) -> io::Result<()> {
            Err(io::ErrorKind::ConnectionRefused.into())
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Err(io::ErrorKind::NotConnected.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn shutdown(&mut self) {}
    }

    #[test]
    fn begin_without_host_is_invalid_config() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        assert!(!client.begin(ClientConfig::default()));
        assert_eq!(client.last_error(), Some(ObsWsError::InvalidConfig));
        assert_eq!(client.status(), ObsWsStatus::Error);
    }

    #[test]
    fn begin_with_dead_transport_is_transport_unavailable() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        assert!(!client.begin(ClientConfig::new("127.0.0.1")));
        assert_eq!(client.last_error(), Some(ObsWsError::TransportUnavailable));
        assert_eq!(client.status(), ObsWsStatus::Error);
    }

    #[test]
    fn send_request_requires_established_handshake() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        assert!(!client.send_request("GetVersion", ""));
        assert_eq!(client.last_error(), Some(ObsWsError::TransportUnavailable));
    }

    #[test]
    fn send_request_requires_a_type() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        assert!(!client.send_request("", ""));
        // No terminal error for a caller mistake.
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn request_ids_count_up_from_one() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        assert_eq!(client.next_request_id(), "1");
        assert_eq!(client.next_request_id(), "2");
        assert_eq!(client.next_request_id(), "3");
    }

    #[test]
    fn close_is_idempotent() {
        let mut client = ObsWsClient::with_transport(Box::new(DeadTransport));
        client.close();
        client.close();
        assert_eq!(client.status(), ObsWsStatus::Disconnected);
        assert_eq!(client.last_error(), None);
    }
}
