// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers shared by every `extern "C"` entry point, native and WASM.

use std::any::Any;
use std::ffi::{c_char, CStr, CString};
use std::panic::{self, AssertUnwindSafe};

use crate::observability::messages::kernel::{NullArgument, PanicAtBoundary};
use crate::observability::messages::StructuredLog;

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `body`, turning a panic into `default`.
pub(crate) fn guarded<T>(entry_point: &'static str, default: T, body: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => value,
        Err(payload) => {
            PanicAtBoundary {
                entry_point,
                detail: &panic_detail(payload.as_ref()),
            }
            .log();
            default
        }
    }
}

/// Copy a C string argument, logging a null pointer.
///
/// # Safety
/// `text` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn string_arg(
    text: *const c_char,
    entry_point: &str,
    argument: &str,
) -> Option<String> {
    if text.is_null() {
        NullArgument {
            entry_point,
            argument,
        }
        .log();
        return None;
    }
    Some(CStr::from_ptr(text).to_string_lossy().into_owned())
}

/// Release a string returned by any `xlean_*` entry point.
///
/// # Safety
/// `text` must be null or a string returned by this library that has not
/// been freed.
#[no_mangle]
pub unsafe extern "C" fn xlean_string_free(text: *mut c_char) {
    if !text.is_null() {
        drop(CString::from_raw(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn panics_become_defaults() {
        let value = guarded("test_entry", 7u8, || panic!("boom"));
        assert_eq!(value, 7);
        assert_eq!(panic_detail(&"static"), "static");
        assert_eq!(panic_detail(&String::from("owned")), "owned");
    }

    #[test]
    fn null_string_argument_is_none() {
        let copied = unsafe { string_arg(ptr::null(), "test_entry", "code") };
        assert!(copied.is_none());

        let text = CString::new("def x := 1").unwrap();
        let copied = unsafe { string_arg(text.as_ptr(), "test_entry", "code") };
        assert_eq!(copied.as_deref(), Some("def x := 1"));
    }
}
