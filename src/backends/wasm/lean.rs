// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Lean runtime linked into the browser build, and the C entry points
//! the browser host calls.
//!
//! Lean's object helpers (`lean_inc`, `lean_dec`, `lean_io_result_*`,
//! `lean_string_cstr`) are header-only inlines, so the small subset used
//! here is mirrored over the object header layout. Everything else is an
//! exported symbol of the linked Lean libraries.
//!
//! The host keeps one kernel per page:
//!
//! ```text
//! kernel = xlean_wasm_kernel_create(config_yaml | NULL)
//! frames = xlean_wasm_kernel_execute(kernel, execution_count, code, silent)
//! xlean_string_free(frames)
//! xlean_wasm_kernel_free(kernel)
//! ```

use std::ffi::{c_char, c_uint, CStr, CString};
use std::ptr::{self, NonNull};

use crate::backends::boundary::{guarded, string_arg};
use crate::backends::wasm::kernel::WasmKernel;
use crate::backends::wasm::runtime::LanguageRuntime;
use crate::config::BridgeConfig;
use crate::errors::RuntimeFault;
use crate::observability::init_tracing;
use crate::session::EnvId;

/// Common header of every heap-allocated Lean object.
#[repr(C)]
struct LeanObject {
    rc: i32,
    // m_cs_sz:16, m_other:8, m_tag:8
    bits: u32,
}

#[allow(dead_code)]
#[repr(C)]
struct LeanCtor {
    header: LeanObject,
    objs: [*mut LeanObject; 0],
}

#[allow(dead_code)]
#[repr(C)]
struct LeanString {
    header: LeanObject,
    size: usize,
    capacity: usize,
    length: usize,
    data: [c_char; 0],
}

type ModuleInitializer = unsafe extern "C" fn(builtin: u8) -> *mut LeanObject;

#[allow(non_snake_case)]
extern "C" {
    fn lean_initialize_runtime_module();
    fn lean_init_task_manager_using(num_workers: c_uint);
    fn lean_initialize();
    fn lean_io_mark_end_initialization();
    fn lean_io_result_show_error(result: *mut LeanObject);
    fn lean_inc_ref_cold(object: *mut LeanObject);
    fn lean_dec_ref_cold(object: *mut LeanObject);
    fn lean_mk_string(text: *const c_char) -> *mut LeanObject;

    fn initialize_xeus_x2dlean_REPL(builtin: u8) -> *mut LeanObject;
    fn initialize_xeus_x2dlean_REPL_Main(builtin: u8) -> *mut LeanObject;
    fn initialize_xeus_x2dlean_WasmRepl(builtin: u8) -> *mut LeanObject;

    fn lean_wasm_repl_init() -> *mut LeanObject;
    fn lean_wasm_repl_create_state() -> *mut LeanObject;
    fn lean_wasm_repl_execute(
        state: *mut LeanObject,
        code: *mut LeanObject,
        env_id: u32,
        has_env: u8,
    ) -> *mut LeanObject;
}

fn is_scalar(object: *mut LeanObject) -> bool {
    object as usize & 1 == 1
}

unsafe fn inc(object: *mut LeanObject) {
    if is_scalar(object) {
        return;
    }
    if (*object).rc > 0 {
        (*object).rc += 1;
    } else if (*object).rc != 0 {
        lean_inc_ref_cold(object);
    }
}

unsafe fn dec(object: *mut LeanObject) {
    if is_scalar(object) {
        return;
    }
    if (*object).rc > 1 {
        (*object).rc -= 1;
    } else if (*object).rc != 0 {
        lean_dec_ref_cold(object);
    }
}

/// One owned reference, released on drop.
pub struct LeanRef(NonNull<LeanObject>);

impl LeanRef {
    fn new(object: *mut LeanObject, what: &str) -> Result<Self, RuntimeFault> {
        NonNull::new(object)
            .map(Self)
            .ok_or_else(|| RuntimeFault::new(format!("{what} returned null")))
    }

    fn as_ptr(&self) -> *mut LeanObject {
        self.0.as_ptr()
    }

    /// Unwrap an IO result. The error is printed by the runtime itself.
    fn io_value(result: *mut LeanObject, what: &str) -> Result<Self, RuntimeFault> {
        let result = Self::new(result, what)?;
        // SAFETY: non-null IO results are constructor objects with one field.
        unsafe {
            if (*result.as_ptr()).bits >> 24 == 1 {
                lean_io_result_show_error(result.as_ptr());
                return Err(RuntimeFault::new(format!("{what} raised an IO error")));
            }
            let value = *(*result.as_ptr().cast::<LeanCtor>()).objs.as_ptr();
            inc(value);
            Self::new(value, what)
        }
    }

    fn to_text(&self) -> String {
        // SAFETY: only called on string results of the evaluator.
        unsafe {
            let string = self.as_ptr().cast::<LeanString>();
            CStr::from_ptr((*string).data.as_ptr())
                .to_string_lossy()
                .into_owned()
        }
    }
}

impl Drop for LeanRef {
    fn drop(&mut self) {
        // SAFETY: the reference was counted when this value was built.
        unsafe { dec(self.as_ptr()) }
    }
}

fn module_initializer(module: &str) -> Option<ModuleInitializer> {
    match module {
        "REPL" => Some(initialize_xeus_x2dlean_REPL),
        "REPL.Main" => Some(initialize_xeus_x2dlean_REPL_Main),
        "WasmRepl" => Some(initialize_xeus_x2dlean_WasmRepl),
        _ => None,
    }
}

/// The Lean runtime statically linked into this module. There is one per
/// process; creating a second is never done by the entry points below.
pub struct LeanRuntime {
    _private: (),
}

impl LeanRuntime {
    fn new() -> Self {
        Self { _private: () }
    }
}

impl LanguageRuntime for LeanRuntime {
    type Session = LeanRef;

    fn initialize_runtime_module(&mut self, scheduler_workers: usize) -> Result<(), RuntimeFault> {
        let workers = c_uint::try_from(scheduler_workers)
            .map_err(|_| RuntimeFault::new(format!("{scheduler_workers} scheduler workers")))?;
        unsafe {
            lean_initialize_runtime_module();
            lean_init_task_manager_using(workers);
        }
        Ok(())
    }

    fn initialize_globals(&mut self) -> Result<(), RuntimeFault> {
        unsafe { lean_initialize() };
        Ok(())
    }

    fn initialize_module(&mut self, module: &str) -> Result<(), RuntimeFault> {
        let initializer = module_initializer(module)
            .ok_or_else(|| RuntimeFault::new(format!("no initializer linked for {module}")))?;
        // builtin = 1, as for modules imported by the main module
        let result = unsafe { initializer(1) };
        LeanRef::io_value(result, module).map(drop)
    }

    fn mark_end_initialization(&mut self) -> Result<(), RuntimeFault> {
        unsafe { lean_io_mark_end_initialization() };
        Ok(())
    }

    fn initialize_search_path(&mut self) -> Result<(), RuntimeFault> {
        let result = unsafe { lean_wasm_repl_init() };
        LeanRef::io_value(result, "lean_wasm_repl_init").map(drop)
    }

    fn create_session(&mut self) -> Result<LeanRef, RuntimeFault> {
        let result = unsafe { lean_wasm_repl_create_state() };
        LeanRef::io_value(result, "lean_wasm_repl_create_state")
    }

    fn execute(
        &mut self,
        session: &LeanRef,
        code: &str,
        env: Option<EnvId>,
    ) -> Result<String, RuntimeFault> {
        let code = CString::new(code).map_err(|_| RuntimeFault::new("code contains a NUL byte"))?;
        let (env_id, has_env) = match env {
            Some(EnvId(id)) => (id, 1),
            None => (0, 0),
        };
        // The callee consumes one reference to each argument.
        let result = unsafe {
            inc(session.as_ptr());
            let code = lean_mk_string(code.as_ptr());
            lean_wasm_repl_execute(session.as_ptr(), code, env_id, has_env)
        };
        LeanRef::io_value(result, "lean_wasm_repl_execute").map(|text| text.to_text())
    }
}

fn config_from_yaml(config_yaml: *const c_char) -> BridgeConfig {
    if config_yaml.is_null() {
        return BridgeConfig::default();
    }
    // SAFETY: checked for null; the caller passes a NUL-terminated string.
    let text = unsafe { CStr::from_ptr(config_yaml) }.to_string_lossy();
    serde_yaml::from_str(&text).unwrap_or_else(|error| {
        tracing::warn!(error = %error, "Falling back to default config");
        BridgeConfig::default()
    })
}

fn owned_string(text: String) -> *mut c_char {
    CString::new(text).unwrap_or_default().into_raw()
}

/// Bootstrap the linked Lean runtime. Returns null if any stage fails.
///
/// # Safety
/// `config_yaml` must be null or a NUL-terminated YAML document.
#[no_mangle]
pub unsafe extern "C" fn xlean_wasm_kernel_create(
    config_yaml: *const c_char,
) -> *mut WasmKernel<LeanRuntime> {
    guarded("xlean_wasm_kernel_create", ptr::null_mut(), || {
        init_tracing();
        let config = config_from_yaml(config_yaml);
        // Failures are logged by the bootstrap itself
        WasmKernel::new(LeanRuntime::new(), &config)
            .map_or(ptr::null_mut(), |kernel| Box::into_raw(Box::new(kernel)))
    })
}

/// Evaluate one cell. Returns an owned JSON array of frames; release it
/// with `xlean_string_free`.
///
/// # Safety
/// `kernel` must be null or a live kernel from [`xlean_wasm_kernel_create`];
/// `code` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn xlean_wasm_kernel_execute(
    kernel: *mut WasmKernel<LeanRuntime>,
    execution_count: u32,
    code: *const c_char,
    silent: u8,
) -> *mut c_char {
    let frames = guarded("xlean_wasm_kernel_execute", "[]".to_string(), || {
        let code = string_arg(code, "xlean_wasm_kernel_execute", "code");
        match (kernel.as_mut(), code) {
            (Some(kernel), Some(code)) => kernel.execute(execution_count, &code, silent != 0).to_string(),
            _ => "[]".to_string(),
        }
    });
    owned_string(frames)
}

/// Owned JSON `kernel_info_reply` frame, or an empty string for a null kernel.
///
/// # Safety
/// `kernel` must be null or a live kernel from [`xlean_wasm_kernel_create`].
#[no_mangle]
pub unsafe extern "C" fn xlean_wasm_kernel_info(kernel: *mut WasmKernel<LeanRuntime>) -> *mut c_char {
    let info = guarded("xlean_wasm_kernel_info", String::new(), || {
        kernel
            .as_mut()
            .map(|kernel| kernel.kernel_info().to_string())
            .unwrap_or_default()
    });
    owned_string(info)
}

/// Release a kernel and its session.
///
/// # Safety
/// `kernel` must be null or a kernel from [`xlean_wasm_kernel_create`], and
/// this must be the last use of it.
#[no_mangle]
pub unsafe extern "C" fn xlean_wasm_kernel_free(kernel: *mut WasmKernel<LeanRuntime>) {
    if kernel.is_null() {
        return;
    }
    guarded("xlean_wasm_kernel_free", (), || {
        let mut kernel = Box::from_raw(kernel);
        kernel.shutdown();
    });
}
