//! C ABI for linking pinpod-core as a static library from Android (NDK), iOS or other C/C++ hosts.
//! Inputs, actions and snapshots cross the boundary as UTF-8 JSON.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::controller::{Controller, ControllerConfig};
use crate::event::{Action, Input};
use crate::ABI_VERSION;

/// Error crossing the C boundary. Callers only see -1; the variant is logged.
#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    #[error("null pointer")]
    NullPointer,
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output buffer too small: need {need}, have {have}")]
    BufferTooSmall { need: usize, have: usize },
}

/// Controller behind an opaque handle. Actions stay in `outbox` until they are written out,
/// so a call that fails on a short buffer does not lose them.
struct Handle {
    controller: Controller,
    outbox: Vec<Action>,
}

/// Returns the ABI version. Used so the staticlib exports a C symbol and is linkable.
#[no_mangle]
pub extern "C" fn pinpod_core_version() -> u8 {
    ABI_VERSION
}

/// Create a controller. `config_json` may be null for defaults.
/// Returns opaque handle, or null if the config does not parse.
#[no_mangle]
pub extern "C" fn pinpod_core_create(config_json: *const u8, config_len: usize) -> *mut c_void {
    let config = if config_json.is_null() {
        ControllerConfig::default()
    } else {
        match read_json::<ControllerConfig>(config_json, config_len) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "pinpod_core_create: bad config");
                return std::ptr::null_mut();
            }
        }
    };
    let handle = Handle {
        controller: Controller::new(config),
        outbox: Vec::new(),
    };
    Box::into_raw(Box::new(handle)) as *mut c_void
}

/// Destroy controller. No-op if h is null.
#[no_mangle]
pub extern "C" fn pinpod_core_destroy(h: *mut c_void) {
    if h.is_null() {
        return;
    }
    let _ = unsafe { Box::from_raw(h as *mut Handle) };
}

/// Deliver one JSON-encoded `Input`. Writes the pending actions as a JSON array to out_buf.
/// Returns bytes written, or -1 on error (null handle, bad input, out_buf too small).
/// Actions not written are kept and returned by the next `handle` or `take_actions` call.
#[no_mangle]
pub extern "C" fn pinpod_core_handle(
    h: *mut c_void,
    input_json: *const u8,
    input_len: usize,
    out_buf: *mut u8,
    out_buf_len: usize,
) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    let input = match read_json::<Input>(input_json, input_len) {
        Ok(i) => i,
        Err(e) => {
            tracing::warn!(error = %e, "pinpod_core_handle: bad input");
            return -1;
        }
    };
    let actions = handle.controller.handle(input);
    handle.outbox.extend(actions);
    flush(handle, out_buf, out_buf_len)
}

/// Write the pending actions without delivering an input. Returns bytes written, or -1 on error.
#[no_mangle]
pub extern "C" fn pinpod_core_take_actions(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &mut *(h as *mut Handle) };
    flush(handle, out_buf, out_buf_len)
}

/// Write the current snapshot as JSON to out_buf. Returns bytes written, or -1 on error.
#[no_mangle]
pub extern "C" fn pinpod_core_snapshot(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    if h.is_null() {
        return -1;
    }
    let handle = unsafe { &*(h as *const Handle) };
    finish(write_json(&handle.controller.snapshot(), out_buf, out_buf_len))
}

fn flush(handle: &mut Handle, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    let written = write_json(&handle.outbox, out_buf, out_buf_len);
    if written.is_ok() {
        handle.outbox.clear();
    } else {
        tracing::debug!(pending = handle.outbox.len(), "actions kept for next call");
    }
    finish(written)
}

fn read_json<T: DeserializeOwned>(ptr: *const u8, len: usize) -> Result<T, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::NullPointer);
    }
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    let s = std::str::from_utf8(bytes)?;
    Ok(serde_json::from_str(s)?)
}

fn write_json<T: Serialize>(value: &T, out_buf: *mut u8, out_buf_len: usize) -> Result<usize, FfiError> {
    if out_buf.is_null() {
        return Err(FfiError::NullPointer);
    }
    let bytes = serde_json::to_vec(value)?;
    if bytes.len() > out_buf_len || bytes.len() > c_int::MAX as usize {
        return Err(FfiError::BufferTooSmall {
            need: bytes.len(),
            have: out_buf_len,
        });
    }
    unsafe {
        out_buf.copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
    }
    Ok(bytes.len())
}

fn finish(result: Result<usize, FfiError>) -> c_int {
    match result {
        Ok(n) => n as c_int,
        Err(e) => {
            tracing::warn!(error = %e, "pinpod ffi call failed");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Snapshot;
    use crate::state::NodeState;

    fn handle(h: *mut c_void, input: &str, out: &mut [u8]) -> c_int {
        pinpod_core_handle(h, input.as_ptr(), input.len(), out.as_mut_ptr(), out.len())
    }

    #[test]
    fn version_matches_const() {
        assert_eq!(pinpod_core_version(), ABI_VERSION);
    }

    #[test]
    fn create_handle_snapshot_destroy() {
        let h = pinpod_core_create(std::ptr::null(), 0);
        assert!(!h.is_null());

        let mut out = vec![0u8; 4096];
        let n = handle(h, r#"{"node_state_changed":"started"}"#, &mut out);
        assert!(n > 0);
        let actions: Vec<Action> = serde_json::from_slice(&out[..n as usize]).unwrap();
        assert_eq!(actions.len(), 4);
        assert!(actions.contains(&Action::FetchSummary));

        let n = pinpod_core_snapshot(h, out.as_mut_ptr(), out.len());
        assert!(n > 0);
        let snap: Snapshot = serde_json::from_slice(&out[..n as usize]).unwrap();
        assert_eq!(snap.node_state, NodeState::Started);

        pinpod_core_destroy(h);
    }

    #[test]
    fn create_with_config() {
        let cfg = r#"{"demo_file_path":"/sdcard/demo.png"}"#;
        let h = pinpod_core_create(cfg.as_ptr(), cfg.len());
        assert!(!h.is_null());
        pinpod_core_destroy(h);

        let bad = "{not json";
        assert!(pinpod_core_create(bad.as_ptr(), bad.len()).is_null());
    }

    #[test]
    fn errors_return_minus_one() {
        let mut out = vec![0u8; 8];
        assert_eq!(handle(std::ptr::null_mut(), "\"toggle_node\"", &mut out), -1);

        let h = pinpod_core_create(std::ptr::null(), 0);
        assert_eq!(handle(h, "\"not_an_input\"", &mut out), -1);
        // Four actions do not fit into eight bytes.
        assert_eq!(handle(h, r#"{"node_state_changed":"started"}"#, &mut out), -1);
        pinpod_core_destroy(h);
        pinpod_core_destroy(std::ptr::null_mut());
    }

    #[test]
    fn short_buffer_keeps_actions_for_retry() {
        let h = pinpod_core_create(std::ptr::null(), 0);
        let started = r#"{"node_state_changed":"started"}"#;
        let mut small = vec![0u8; 8];
        assert_eq!(handle(h, started, &mut small), -1);

        // Repeating the event adds nothing new, but the first call's actions are still pending.
        let mut out = vec![0u8; 4096];
        let n = handle(h, started, &mut out);
        assert!(n > 0);
        let actions: Vec<Action> = serde_json::from_slice(&out[..n as usize]).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::FetchVersion,
                Action::FetchPeerId,
                Action::FetchThreads,
                Action::FetchSummary,
            ]
        );

        let n = pinpod_core_take_actions(h, out.as_mut_ptr(), out.len());
        assert_eq!(&out[..n as usize], b"[]");
        pinpod_core_destroy(h);
    }

    #[test]
    fn take_actions_drains_after_short_buffer() {
        let h = pinpod_core_create(std::ptr::null(), 0);
        let mut small = vec![0u8; 8];
        assert_eq!(handle(h, r#"{"node_state_changed":"started"}"#, &mut small), -1);
        assert_eq!(pinpod_core_take_actions(h, small.as_mut_ptr(), small.len()), -1);

        let mut out = vec![0u8; 4096];
        let n = pinpod_core_take_actions(h, out.as_mut_ptr(), out.len());
        let actions: Vec<Action> = serde_json::from_slice(&out[..n as usize]).unwrap();
        assert_eq!(actions.len(), 4);
        assert_eq!(pinpod_core_take_actions(std::ptr::null_mut(), out.as_mut_ptr(), out.len()), -1);
        pinpod_core_destroy(h);
    }
}
