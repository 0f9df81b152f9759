//! FFI bindings for devimpact
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `impact_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::config::ScoringConfig;
use crate::error::ComputeError;
use crate::pipeline::{impact_to_json, parse_stats, ImpactProcessor};
use crate::smoothing::apply_ema;
use crate::types::ImpactResult;
use crate::verification::verification_hash;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ComputeError::DateParseError(format!("{s}: {e}")))
}

/// Return a C string, or record the error and return NULL
fn string_result(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute an impact result from raw stats JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_compute(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    string_result(impact_to_json(&json_str))
}

/// Apply one EMA smoothing step.
///
/// Pass `has_previous = 0` for the first computation of a handle.
///
/// # Safety
/// - Pure arithmetic; always safe to call.
#[no_mangle]
pub unsafe extern "C" fn impact_apply_ema(current: f64, previous: f64, has_previous: i32) -> i32 {
    let previous = (has_previous != 0).then_some(previous);
    apply_ema(current, previous) as i32
}

/// Compute the 8-character verification code.
///
/// # Safety
/// - `stats_json`, `result_json`, `date` (YYYY-MM-DD) and `secret` must be valid
///   null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_verification_hash(
    stats_json: *const c_char,
    result_json: *const c_char,
    date: *const c_char,
    secret: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let (Some(stats_str), Some(result_str), Some(date_str), Some(secret_str)) = (
        cstr_to_string(stats_json),
        cstr_to_string(result_json),
        cstr_to_string(date),
        cstr_to_string(secret),
    ) else {
        set_last_error("Invalid string pointer");
        return ptr::null_mut();
    };

    string_result((|| {
        let stats = parse_stats(&stats_str)?;
        let result: ImpactResult = serde_json::from_str(&result_str)?;
        let date = parse_date(&date_str)?;
        verification_hash(secret_str.as_bytes(), &stats, &result, date)
    })())
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to an ImpactProcessor
pub struct ImpactProcessorHandle {
    processor: ImpactProcessor,
}

/// Create a new ImpactProcessor keeping `history_days` snapshots per handle.
///
/// # Safety
/// - Returns a pointer to a newly allocated ImpactProcessor.
/// - Must be freed with `impact_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn impact_processor_new(history_days: i32) -> *mut ImpactProcessorHandle {
    clear_last_error();

    let mut config = ScoringConfig::default();
    if history_days > 0 {
        config.smoothing.history_days = history_days as usize;
    }

    match ImpactProcessor::with_config(config) {
        Ok(processor) => Box::into_raw(Box::new(ImpactProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an ImpactProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `impact_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn impact_processor_free(processor: *mut ImpactProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Compute, smooth and record a result for `date` (YYYY-MM-DD).
///
/// # Safety
/// - `processor` must be a valid pointer returned by `impact_processor_new`.
/// - `json` and `date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_processor_process(
    processor: *mut ImpactProcessorHandle,
    json: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    string_result(
        parse_date(&date_str).and_then(|date| handle.processor.process_json(&json_str, date)),
    )
}

/// Save processor snapshots to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `impact_processor_new`.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_processor_save_snapshots(
    processor: *mut ImpactProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    string_result(handle.processor.save_snapshots())
}

/// Load processor snapshots from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `impact_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_processor_load_snapshots(
    processor: *mut ImpactProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_snapshots(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by devimpact functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a devimpact function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn impact_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next devimpact call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn impact_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn impact_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
