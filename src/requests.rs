//! Builders for common OBS request payloads.
//!
//! Each builder returns a [`Request`] ready for
//! [`ObsWsClient::submit`](crate::ObsWsClient::submit). Requests are
//! fire-and-forget: the response arrives through the event callback keyed by
//! the echoed `requestId`.

use serde_json::{json, Value};

/// One OBS request: the `requestType` plus its optional `requestData`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub request_type: &'static str,
    pub data: Option<Value>,
}

impl Request {
    fn bare(request_type: &'static str) -> Self {
        Self {
            request_type,
            data: None,
        }
    }

    fn with_data(request_type: &'static str, data: Value) -> Self {
        Self {
            request_type,
            data: Some(data),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Scenes
// ─────────────────────────────────────────────────────────────────

/// Switch the current program scene.
pub fn set_current_program_scene(scene_name: &str) -> Request {
    Request::with_data(
        "SetCurrentProgramScene",
        json!({ "sceneName": scene_name }),
    )
}

pub fn get_current_program_scene() -> Request {
    Request::bare("GetCurrentProgramScene")
}

// ─────────────────────────────────────────────────────────────────
// Stream / record / replay / virtual camera outputs
// ─────────────────────────────────────────────────────────────────

pub fn get_stream_status() -> Request {
    Request::bare("GetStreamStatus")
}

pub fn toggle_stream() -> Request {
    Request::bare("ToggleStream")
}

pub fn start_stream() -> Request {
    Request::bare("StartStream")
}

pub fn stop_stream() -> Request {
    Request::bare("StopStream")
}

pub fn get_record_status() -> Request {
    Request::bare("GetRecordStatus")
}

pub fn toggle_record() -> Request {
    Request::bare("ToggleRecord")
}

pub fn start_record() -> Request {
    Request::bare("StartRecord")
}

pub fn stop_record() -> Request {
    Request::bare("StopRecord")
}

pub fn toggle_record_pause() -> Request {
    Request::bare("ToggleRecordPause")
}

pub fn get_replay_buffer_status() -> Request {
    Request::bare("GetReplayBufferStatus")
}

pub fn toggle_replay_buffer() -> Request {
    Request::bare("ToggleReplayBuffer")
}

pub fn start_replay_buffer() -> Request {
    Request::bare("StartReplayBuffer")
}

pub fn stop_replay_buffer() -> Request {
    Request::bare("StopReplayBuffer")
}

pub fn save_replay_buffer() -> Request {
    Request::bare("SaveReplayBuffer")
}

pub fn get_virtual_cam_status() -> Request {
    Request::bare("GetVirtualCamStatus")
}

pub fn toggle_virtual_cam() -> Request {
    Request::bare("ToggleVirtualCam")
}

// ─────────────────────────────────────────────────────────────────
// Studio mode
// ─────────────────────────────────────────────────────────────────

pub fn get_studio_mode_enabled() -> Request {
    Request::bare("GetStudioModeEnabled")
}

pub fn set_studio_mode_enabled(enabled: bool) -> Request {
    Request::with_data(
        "SetStudioModeEnabled",
        json!({ "studioModeEnabled": enabled }),
    )
}

pub fn trigger_studio_mode_transition() -> Request {
    Request::bare("TriggerStudioModeTransition")
}

// ─────────────────────────────────────────────────────────────────
// Audio inputs
// ─────────────────────────────────────────────────────────────────

pub fn get_input_mute(input_name: &str) -> Request {
    Request::with_data("GetInputMute", json!({ "inputName": input_name }))
}

pub fn toggle_input_mute(input_name: &str) -> Request {
    Request::with_data("ToggleInputMute", json!({ "inputName": input_name }))
}

pub fn get_input_volume(input_name: &str) -> Request {
    Request::with_data("GetInputVolume", json!({ "inputName": input_name }))
}

/// Set an input's volume multiplier, clamped to 0.0..=1.0.
pub fn set_input_volume(input_name: &str, volume_mul: f32) -> Request {
    let volume = volume_mul.clamp(0.0, 1.0);
    Request::with_data(
        "SetInputVolume",
        json!({ "inputName": input_name, "inputVolumeMul": volume }),
    )
}

// ─────────────────────────────────────────────────────────────────
// Scene items
// ─────────────────────────────────────────────────────────────────

pub fn get_scene_item_id(scene_name: &str, source_name: &str) -> Request {
    Request::with_data(
        "GetSceneItemId",
        json!({ "sceneName": scene_name, "sourceName": source_name }),
    )
}

pub fn set_scene_item_enabled(scene_name: &str, scene_item_id: i64, enabled: bool) -> Request {
    Request::with_data(
        "SetSceneItemEnabled",
        json!({
            "sceneName": scene_name,
            "sceneItemId": scene_item_id,
            "sceneItemEnabled": enabled
        }),
    )
}
