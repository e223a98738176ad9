// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! C ABI exposed to the embedding runtime.
//!
//! The handle crosses the boundary as an opaque `*mut KernelHandle`. The
//! embedding side stores it in a GC-managed external object whose
//! finalizer calls [`xlean_kernel_finalize`]; it never does arithmetic on
//! the pointer or frees it any other way.
//!
//! No panic and no Rust error crosses this boundary. Every entry point
//! catches panics, rejects null pointers, and falls back to a safe default:
//! a null handle, an empty string, `0`, or doing nothing.
//!
//! Strings returned by [`xlean_kernel_poll`] are owned by the caller and
//! must be released with [`xlean_string_free`].

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::ptr;
use std::time::Duration;

use crate::backends::boundary::{guarded, string_arg};
use crate::backends::native::handle::KernelHandle;
use crate::config::consts::CONFIG_ENV_VAR;
use crate::config::{load_config, BridgeConfig};
use crate::observability::init_tracing;
use crate::observability::messages::kernel::NullArgument;
use crate::observability::messages::StructuredLog;
use crate::protocol::StdioProtocolFactory;
use crate::traits::{KernelPort, ProtocolFactory};

pub use crate::backends::boundary::xlean_string_free;

/// Borrow the handle behind `handle`, logging a null pointer.
///
/// # Safety
/// `handle` must be null or a pointer returned by [`xlean_kernel_init`]
/// that has not been finalized.
unsafe fn handle_ref<'a>(handle: *const KernelHandle, entry_point: &str) -> Option<&'a KernelHandle> {
    if handle.is_null() {
        NullArgument {
            entry_point,
            argument: "handle",
        }
        .log();
        return None;
    }
    Some(&*handle)
}

fn config_from_env() -> BridgeConfig {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => load_config(&path).unwrap_or_else(|error| {
            tracing::warn!(path = %path, error = %error, "Falling back to default config");
            BridgeConfig::default()
        }),
        Err(_) => BridgeConfig::default(),
    }
}

fn init_with_factory(
    connection_path: &str,
    factory: &dyn ProtocolFactory,
    config: &BridgeConfig,
) -> *mut KernelHandle {
    KernelHandle::create(Path::new(connection_path), factory, config)
        .map_or(ptr::null_mut(), |handle| Box::into_raw(Box::new(handle)))
}

/// Install diagnostic logging. Call once before any other entry point.
#[no_mangle]
pub extern "C" fn xlean_ffi_initialize() {
    guarded("xlean_ffi_initialize", (), init_tracing);
}

/// Create a kernel from a connection file. Returns null on any failure.
///
/// # Safety
/// `connection_file` must be null or point to a NUL-terminated path.
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_init(connection_file: *const c_char) -> *mut KernelHandle {
    guarded("xlean_kernel_init", ptr::null_mut(), || {
        match string_arg(connection_file, "xlean_kernel_init", "connection_file") {
            Some(path) => init_with_factory(&path, &StdioProtocolFactory, &config_from_env()),
            None => ptr::null_mut(),
        }
    })
}

/// Next queued request, waiting at most `timeout_ms`. Returns an owned
/// string, empty when nothing arrived.
///
/// # Safety
/// `handle` must be null or a live handle from [`xlean_kernel_init`].
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_poll(handle: *const KernelHandle, timeout_ms: u32) -> *mut c_char {
    let message = guarded("xlean_kernel_poll", String::new(), || {
        handle_ref(handle, "xlean_kernel_poll")
            .and_then(|handle| handle.poll(Duration::from_millis(u64::from(timeout_ms))))
            .unwrap_or_default()
    });
    CString::new(message)
        .unwrap_or_default()
        .into_raw()
}

/// Deliver a successful result for `execution_count`.
///
/// # Safety
/// `handle` must be null or a live handle; `payload` must be null or a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_send_result(
    handle: *const KernelHandle,
    execution_count: u32,
    payload: *const c_char,
) {
    guarded("xlean_kernel_send_result", (), || {
        let handle = handle_ref(handle, "xlean_kernel_send_result");
        let payload = string_arg(payload, "xlean_kernel_send_result", "payload");
        if let (Some(handle), Some(payload)) = (handle, payload) {
            handle.send_result(execution_count, &payload);
        }
    });
}

/// Deliver a failure for `execution_count`.
///
/// # Safety
/// Same as [`xlean_kernel_send_result`].
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_send_error(
    handle: *const KernelHandle,
    execution_count: u32,
    payload: *const c_char,
) {
    guarded("xlean_kernel_send_error", (), || {
        let handle = handle_ref(handle, "xlean_kernel_send_error");
        let payload = string_arg(payload, "xlean_kernel_send_error", "payload");
        if let (Some(handle), Some(payload)) = (handle, payload) {
            handle.send_error(execution_count, &payload);
        }
    });
}

/// `1` once the loop should stop, else `0`. A null handle reports `1`:
/// there is nothing left to poll.
///
/// # Safety
/// `handle` must be null or a live handle from [`xlean_kernel_init`].
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_should_stop(handle: *const KernelHandle) -> u8 {
    guarded("xlean_kernel_should_stop", 0, || {
        handle_ref(handle, "xlean_kernel_should_stop").map_or(1, |handle| u8::from(handle.should_stop()))
    })
}

/// Finalizer for the embedding runtime's external object. Joins the
/// protocol thread, then frees the handle.
///
/// # Safety
/// `handle` must be null or a handle from [`xlean_kernel_init`], and this
/// must be the last use of it.
#[no_mangle]
pub unsafe extern "C" fn xlean_kernel_finalize(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    guarded("xlean_kernel_finalize", (), || {
        drop(Box::from_raw(handle.cast::<KernelHandle>()));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{ScriptedProtocolFactory, ServerStep};
    use crate::protocol::QueuedRequest;
    use std::ffi::CStr;
    use std::io::Write;
    use tempfile::NamedTempFile;

    unsafe fn take_string(raw: *mut c_char) -> String {
        let text = CStr::from_ptr(raw).to_string_lossy().into_owned();
        xlean_string_free(raw);
        text
    }

    #[test]
    fn null_arguments_get_safe_defaults() {
        unsafe {
            assert!(xlean_kernel_init(ptr::null()).is_null());
            assert_eq!(take_string(xlean_kernel_poll(ptr::null(), 0)), "");
            xlean_kernel_send_result(ptr::null(), 1, ptr::null());
            xlean_kernel_send_error(ptr::null(), 1, ptr::null());
            assert_eq!(xlean_kernel_should_stop(ptr::null()), 1);
            xlean_kernel_finalize(ptr::null_mut());
            xlean_string_free(ptr::null_mut());
        }
    }

    #[test]
    fn missing_connection_file_is_null_handle() {
        let path = CString::new("/nonexistent/kernel-ffi.json").unwrap();
        let handle = unsafe { xlean_kernel_init(path.as_ptr()) };
        assert!(handle.is_null());
    }

    #[test]
    fn full_cycle_through_the_c_surface() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"transport": "stdio"}}"#).unwrap();
        let factory = ScriptedProtocolFactory::new(vec![
            ServerStep::execute("#eval 40 + 2"),
            ServerStep::WaitForReplies(1),
            ServerStep::Shutdown,
        ]);
        let replies = factory.replies();
        let config = BridgeConfig {
            startup_wait_ms: 0,
            ..BridgeConfig::default()
        };

        let handle = init_with_factory(file.path().to_str().unwrap(), &factory, &config);
        assert!(!handle.is_null());

        unsafe {
            let raw = take_string(xlean_kernel_poll(handle, 5_000));
            assert_eq!(
                QueuedRequest::decode(&raw),
                QueuedRequest::Execute {
                    code: "#eval 40 + 2".to_string(),
                    execution_count: 1
                }
            );

            let payload = CString::new("42").unwrap();
            xlean_kernel_send_result(handle, 1, payload.as_ptr());

            let raw = take_string(xlean_kernel_poll(handle, 5_000));
            assert_eq!(QueuedRequest::decode(&raw), QueuedRequest::Shutdown);
            assert_eq!(xlean_kernel_should_stop(handle), 1);

            xlean_kernel_finalize(handle.cast());
        }

        let replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content["status"], "ok");
    }
}
