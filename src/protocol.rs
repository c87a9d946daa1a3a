//! OBS WebSocket v5 protocol messages.

use serde::Deserialize;
use serde_json::Value;

/// OBS WebSocket op codes.
pub mod op {
    pub const HELLO: u32 = 0;
    pub const IDENTIFY: u32 = 1;
    pub const IDENTIFIED: u32 = 2;
    pub const EVENT: u32 = 5;
    pub const REQUEST: u32 = 6;
    pub const REQUEST_RESPONSE: u32 = 7;
}

/// Event subscription bits for the Identify `eventSubscriptions` mask.
///
/// The low-volume categories are ORed into [`ALL`](subscription::ALL);
/// high-volume categories must be opted into explicitly.
pub mod subscription {
    pub const GENERAL: u64 = 1 << 0;
    pub const CONFIG: u64 = 1 << 1;
    pub const SCENES: u64 = 1 << 2;
    pub const INPUTS: u64 = 1 << 3;
    pub const TRANSITIONS: u64 = 1 << 4;
    pub const FILTERS: u64 = 1 << 5;
    pub const OUTPUTS: u64 = 1 << 6;
    pub const SCENE_ITEMS: u64 = 1 << 7;
    pub const MEDIA_INPUTS: u64 = 1 << 8;
    pub const VENDORS: u64 = 1 << 9;
    pub const UI: u64 = 1 << 10;

    /// All low-volume event categories.
    pub const ALL: u64 = GENERAL
        | CONFIG
        | SCENES
        | INPUTS
        | TRANSITIONS
        | FILTERS
        | OUTPUTS
        | SCENE_ITEMS
        | MEDIA_INPUTS
        | VENDORS
        | UI;

    // High-volume categories.
    pub const INPUT_VOLUME_METERS: u64 = 1 << 16;
    pub const INPUT_ACTIVE_STATE_CHANGED: u64 = 1 << 17;
    pub const INPUT_SHOW_STATE_CHANGED: u64 = 1 << 18;
    pub const SCENE_ITEM_TRANSFORM_CHANGED: u64 = 1 << 19;
}

/// Envelope for every message on the text channel.
#[derive(Debug, Deserialize)]
pub struct ServerMessage {
    pub op: u32,
    pub d: Value,
}

/// Server Hello payload (`op=0`).
#[derive(Debug, Deserialize)]
pub struct Hello {
    #[serde(rename = "rpcVersion")]
    pub rpc_version: u32,
    pub authentication: Option<AuthChallenge>,
}

/// Authentication challenge from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// One record handed to the event callback.
///
/// For server events `id` is the OBS `eventType` and `payload` the serialized
/// `eventData` object. For request responses `id` is the echoed `requestId`
/// and `payload` the serialized response data. Empty string means absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsEvent {
    pub id: String,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_all_is_low_volume_union() {
        assert_eq!(subscription::ALL, 0x7FF);
        assert_eq!(subscription::ALL & subscription::INPUT_VOLUME_METERS, 0);
    }

    #[test]
    fn parses_hello_with_authentication() {
        let raw = r#"{"op":0,"d":{"obsWebSocketVersion":"5.3.0","rpcVersion":1,
            "authentication":{"challenge":"abc","salt":"def"}}}"#;
        let message: ServerMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(message.op, op::HELLO);

        let hello: Hello = serde_json::from_value(message.d).unwrap();
        assert_eq!(hello.rpc_version, 1);
        let auth = hello.authentication.unwrap();
        assert_eq!(auth.challenge, "abc");
        assert_eq!(auth.salt, "def");
    }

    #[test]
    fn parses_hello_without_authentication() {
        let hello: Hello = serde_json::from_str(r#"{"rpcVersion":1}"#).unwrap();
        assert_eq!(hello.rpc_version, 1);
        assert!(hello.authentication.is_none());
    }

    #[test]
    fn hello_without_rpc_version_is_an_error() {
        assert!(serde_json::from_str::<Hello>(r#"{"authentication":null}"#).is_err());
    }

    #[test]
    fn message_without_data_is_an_error() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"op":5}"#).is_err());
    }
}
