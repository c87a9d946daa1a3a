//! HTTP/1.1 upgrade handshake (RFC 6455 section 4, client side).

use base64::Engine;
use rand::Rng;
use sha1::{Digest, Sha1};

/// RFC 6455 GUID for the `Sec-WebSocket-Accept` calculation.
const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on the buffered server response headers.
pub const MAX_HANDSHAKE_HEADER: usize = 1024;

/// Generate a fresh `Sec-WebSocket-Key`: 16 random bytes, Base64-encoded.
pub fn generate_websocket_key() -> String {
    let mut raw = [0u8; 16];
    rand::rng().fill(&mut raw);
    base64::engine::general_purpose::STANDARD.encode(raw)
}

/// Compute the accept value the server must echo for `key`.
///
/// Per RFC 6455 section 4.2.2: Base64 of the SHA-1 over the client key
/// concatenated with the fixed GUID.
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Build the upgrade request for the obs-websocket endpoint.
pub fn build_upgrade_request(host: &str, port: u16, key: &str) -> String {
    format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}:{port}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Protocol: obswebsocket.json\r\n\
         User-Agent: obsws-rs/{version}\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         \r\n",
        version = env!("CARGO_PKG_VERSION"),
    )
}

/// Outcome of scanning the handshake buffer for the server's response.
#[derive(Debug)]
pub enum UpgradeOutcome {
    /// Header terminator not seen yet; keep buffering.
    Incomplete,
    /// Upgrade rejected; the reason is a single log line.
    Rejected(&'static str),
    /// Upgrade accepted. `trailing` holds bytes past the header terminator,
    /// which already belong to the WebSocket stream.
    Accepted { trailing: Vec<u8> },
}

/// Validate the buffered response against the expected accept value.
///
/// The status line must report 101 and the `Sec-WebSocket-Accept` header
/// (name matched case-insensitively) must equal `expected_accept` byte for
/// byte after trimming whitespace.
pub fn parse_upgrade_response(buffer: &[u8], expected_accept: &str) -> UpgradeOutcome {
    let Some(terminator) = find_subsequence(buffer, b"\r\n\r\n") else {
        return UpgradeOutcome::Incomplete;
    };

    let header = String::from_utf8_lossy(&buffer[..terminator]);
    let trailing = buffer[terminator + 4..].to_vec();

    let mut lines = header.split("\r\n");
    let Some(status_line) = lines.next() else {
        return UpgradeOutcome::Rejected("malformed handshake response");
    };
    if !status_line.contains("101") {
        return UpgradeOutcome::Rejected("http upgrade rejected by server");
    }

    let accept = lines.find_map(|line| header_value(line, "sec-websocket-accept"));
    let Some(accept) = accept else {
        return UpgradeOutcome::Rejected("response missing Sec-WebSocket-Accept header");
    };

    if accept.trim() != expected_accept {
        return UpgradeOutcome::Rejected("Sec-WebSocket-Accept mismatch");
    }

    UpgradeOutcome::Accepted { trailing }
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (header_name, value) = line.split_once(':')?;
    header_name.trim().eq_ignore_ascii_case(name).then_some(value)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
