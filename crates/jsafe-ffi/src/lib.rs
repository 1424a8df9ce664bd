//! C-callable surface over [`jsafe_core`].
//!
//! Every value is addressed by an opaque [`JsafeValue`] handle. The caller
//! owns the handles returned by the `jsafe_new_*` constructors until it
//! attaches them with `jsafe_add` / `jsafe_set_property` (ownership moves to
//! the container) or releases them with `jsafe_free_value`. Handles returned
//! by `jsafe_get_property` / `jsafe_get_index` are borrowed: they go stale
//! when their owner is released and must never be freed.
//!
//! ```c
//! #include "jsafe.h"
//!
//! jsafe_value obj = jsafe_new_obj();
//! jsafe_set_property(obj, "a", jsafe_new_num(1));
//!
//! jsafe_string out = jsafe_to_string(obj);
//! puts(out.ptr);                 // {"a":1}
//!
//! jsafe_free_string(out.handle);
//! jsafe_free_value(obj);
//! ```
//!
//! # Errors
//!
//! Each call stores a [`JsafeStatus`] that `jsafe_last_status` returns on the
//! same thread. Mutators and release functions also return it directly.
//! Getters return an in-band marker on failure (`-1`, NaN, `0`, or a null
//! pointer, as documented per function). Kind predicates never fail.
//!
//! All calls are serialized by one process-wide lock; the core itself is
//! single-threaded.

mod state;
mod status;

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int, c_uint};
use std::ptr;
use std::slice;

use jsafe_core::{Kind, PrettyOptions, StringId, Text, ValueId};

pub use state::{LOG_ENV, STRING_CAPACITY_ENV, VALUE_CAPACITY_ENV};
pub use status::JsafeStatus;

use state::with_arena;
use status::{record, set_last, status_of};

/// Opaque value handle. `0` is the absent sentinel.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsafeValue(pub u64);

impl JsafeValue {
    pub const ABSENT: JsafeValue = JsafeValue(0);

    fn id(self) -> ValueId {
        ValueId::from_raw(self.0)
    }
}

impl From<ValueId> for JsafeValue {
    fn from(id: ValueId) -> Self {
        JsafeValue(id.into_raw())
    }
}

/// Opaque handle of an owned serialized string. `0` never names a string.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsafeStringHandle(pub u64);

/// Borrowed view of a string value. `ptr` is NUL-terminated, but `len` is
/// authoritative. Null `ptr` signals an error.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct JsafeText {
    pub ptr: *const c_char,
    pub len: usize,
}

impl JsafeText {
    const NONE: JsafeText = JsafeText {
        ptr: ptr::null(),
        len: 0,
    };

    fn borrow(text: &Text) -> Self {
        Self {
            ptr: text.as_c_ptr(),
            len: text.len(),
        }
    }
}

/// Owned serialized JSON. Release with `jsafe_free_string(handle)`. Null
/// `ptr` signals an error.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct JsafeString {
    pub handle: JsafeStringHandle,
    pub ptr: *const c_char,
    pub len: usize,
}

impl JsafeString {
    const NONE: JsafeString = JsafeString {
        handle: JsafeStringHandle(0),
        ptr: ptr::null(),
        len: 0,
    };
}

/// Live allocation counts.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsafeStats {
    pub live_values: usize,
    pub live_strings: usize,
    pub roots: usize,
}

fn null_pointer<T>(op: &'static str, fallback: T) -> T {
    tracing::warn!(op, "null pointer argument");
    set_last(JsafeStatus::NullPointer);
    fallback
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn c_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    Some(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}

fn created(id: ValueId) -> JsafeValue {
    set_last(JsafeStatus::Ok);
    id.into()
}

fn flag(b: bool) -> c_int {
    c_int::from(b)
}

// === Construction ===

/// New empty object, owned by the caller.
#[no_mangle]
pub extern "C" fn jsafe_new_obj() -> JsafeValue {
    created(with_arena(|arena| arena.new_object()))
}

/// Same as `jsafe_new_obj`; kept for hosts written against the document-root API.
#[no_mangle]
pub extern "C" fn jsafe_new_root() -> JsafeValue {
    jsafe_new_obj()
}

/// New empty array, owned by the caller.
#[no_mangle]
pub extern "C" fn jsafe_new_arr() -> JsafeValue {
    created(with_arena(|arena| arena.new_array()))
}

#[no_mangle]
pub extern "C" fn jsafe_new_null() -> JsafeValue {
    created(with_arena(|arena| arena.new_null()))
}

/// Any non-zero `value` is true.
#[no_mangle]
pub extern "C" fn jsafe_new_bool(value: c_int) -> JsafeValue {
    created(with_arena(|arena| arena.new_bool(value != 0)))
}

#[no_mangle]
pub extern "C" fn jsafe_new_num(value: c_double) -> JsafeValue {
    created(with_arena(|arena| arena.new_number(value)))
}

/// New string value holding a copy of the NUL-terminated `text`.
///
/// Returns the absent handle with `NullPointer` status if `text` is null.
///
/// # Safety
///
/// `text` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jsafe_new_text(text: *const c_char) -> JsafeValue {
    match unsafe { c_bytes(text) } {
        Some(bytes) => created(with_arena(|arena| arena.new_text(bytes))),
        None => null_pointer("jsafe_new_text", JsafeValue::ABSENT),
    }
}

/// New string value holding a copy of `len` bytes at `text`. Embedded NULs
/// are kept.
///
/// # Safety
///
/// `text` must be valid for reads of `len` bytes; it may be null only when
/// `len` is 0.
#[no_mangle]
pub unsafe extern "C" fn jsafe_new_text_len(text: *const c_char, len: usize) -> JsafeValue {
    let bytes: &[u8] = if len == 0 {
        &[]
    } else if text.is_null() {
        return null_pointer("jsafe_new_text_len", JsafeValue::ABSENT);
    } else {
        // SAFETY: non-null and valid for `len` bytes per the caller's contract.
        unsafe { slice::from_raw_parts(text.cast::<u8>(), len) }
    };
    created(with_arena(|arena| arena.new_text(bytes)))
}

// === Mutation ===

/// Appends `value` to the array `container`, which takes ownership of it.
///
/// On any failure the caller keeps ownership of `value`.
#[no_mangle]
pub extern "C" fn jsafe_add(container: JsafeValue, value: JsafeValue) -> JsafeStatus {
    let result = with_arena(|arena| arena.push(container.id(), value.id()));
    status_of("jsafe_add", result)
}

/// Stores `value` under `key` in the object `container`, which takes
/// ownership of it. A previous value under `key` is released, together with
/// everything it owns, and the key keeps its position.
///
/// On any failure the caller keeps ownership of `value`.
///
/// # Safety
///
/// `key` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jsafe_set_property(
    container: JsafeValue,
    key: *const c_char,
    value: JsafeValue,
) -> JsafeStatus {
    let Some(key) = (unsafe { c_bytes(key) }) else {
        return null_pointer("jsafe_set_property", JsafeStatus::NullPointer);
    };
    let result = with_arena(|arena| arena.set(container.id(), key, value.id()));
    status_of("jsafe_set_property", result)
}

/// Removes `key` from the object `container` and returns its value, now
/// owned by the caller. Returns the absent handle if the key is missing.
///
/// # Safety
///
/// `key` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jsafe_take_property(container: JsafeValue, key: *const c_char) -> JsafeValue {
    let Some(key) = (unsafe { c_bytes(key) }) else {
        return null_pointer("jsafe_take_property", JsafeValue::ABSENT);
    };
    let result = with_arena(|arena| arena.take(container.id(), key));
    record("jsafe_take_property", result, None).map_or(JsafeValue::ABSENT, JsafeValue::from)
}

/// Reserves room for `size` more children in an object or array. Never
/// changes what any query returns.
#[no_mangle]
pub extern "C" fn jsafe_prealloc(container: JsafeValue, size: c_uint) -> JsafeStatus {
    let result = with_arena(|arena| arena.reserve(container.id(), size as usize));
    status_of("jsafe_prealloc", result)
}

// === Queries ===

/// Borrowed handle to the value under `key`, or the absent handle if the key
/// is missing (status `Ok`) or `container` is not an object.
///
/// # Safety
///
/// `key` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jsafe_get_property(container: JsafeValue, key: *const c_char) -> JsafeValue {
    let Some(key) = (unsafe { c_bytes(key) }) else {
        return null_pointer("jsafe_get_property", JsafeValue::ABSENT);
    };
    let result = with_arena(|arena| arena.get(container.id(), key));
    record("jsafe_get_property", result, None).map_or(JsafeValue::ABSENT, JsafeValue::from)
}

/// Borrowed handle to element `index` of an array, or the absent handle past
/// the end.
#[no_mangle]
pub extern "C" fn jsafe_get_index(container: JsafeValue, index: c_uint) -> JsafeValue {
    let result = with_arena(|arena| arena.get_index(container.id(), index as usize));
    record("jsafe_get_index", result, None).map_or(JsafeValue::ABSENT, JsafeValue::from)
}

/// Number of children of an object or array; `0` on failure.
#[no_mangle]
pub extern "C" fn jsafe_get_len(value: JsafeValue) -> c_uint {
    let result = with_arena(|arena| arena.len(value.id()));
    let len = record("jsafe_get_len", result, 0);
    c_uint::try_from(len).unwrap_or(c_uint::MAX)
}

/// Borrowed view of a string value, valid until the value (or its owner) is
/// released. Null `ptr` on failure.
#[no_mangle]
pub extern "C" fn jsafe_get_text(value: JsafeValue) -> JsafeText {
    let result = with_arena(|arena| arena.text(value.id()).map(JsafeText::borrow));
    record("jsafe_get_text", result, JsafeText::NONE)
}

/// NaN on failure; check `jsafe_last_status` to tell it from a stored NaN.
#[no_mangle]
pub extern "C" fn jsafe_get_num(value: JsafeValue) -> c_double {
    let result = with_arena(|arena| arena.number(value.id()));
    record("jsafe_get_num", result, f64::NAN)
}

/// `1` or `0`; `-1` on failure.
#[no_mangle]
pub extern "C" fn jsafe_get_bool(value: JsafeValue) -> c_int {
    let result = with_arena(|arena| arena.boolean(value.id()).map(flag));
    record("jsafe_get_bool", result, -1)
}

/// Compact JSON for the tree rooted at `value`, as a new caller-owned string
/// that stays valid after the tree is released.
#[no_mangle]
pub extern "C" fn jsafe_to_string(value: JsafeValue) -> JsafeString {
    let result = with_arena(|arena| -> jsafe_core::Result<JsafeString> {
        let id = arena.serialize(value.id())?;
        Ok(owned_string(arena.string(id)?, id))
    });
    record("jsafe_to_string", result, JsafeString::NONE)
}

/// Like `jsafe_to_string`, one element per line. `spaces` is the indent
/// width per level; `0` indents with tabs.
#[no_mangle]
pub extern "C" fn jsafe_to_pretty(value: JsafeValue, spaces: c_uint) -> JsafeString {
    let options = PrettyOptions::from_spaces(spaces as usize);
    let result = with_arena(|arena| -> jsafe_core::Result<JsafeString> {
        let id = arena.serialize_pretty(value.id(), &options)?;
        Ok(owned_string(arena.string(id)?, id))
    });
    record("jsafe_to_pretty", result, JsafeString::NONE)
}

fn owned_string(text: &Text, id: StringId) -> JsafeString {
    JsafeString {
        handle: JsafeStringHandle(id.into_raw()),
        ptr: text.as_c_ptr(),
        len: text.len(),
    }
}

// === Predicates ===

/// `1` if the object has `key`, `0` if not, `-1` if `value` is not an object.
///
/// # Safety
///
/// `key` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jsafe_has_key(value: JsafeValue, key: *const c_char) -> c_int {
    let Some(key) = (unsafe { c_bytes(key) }) else {
        return null_pointer("jsafe_has_key", -1);
    };
    let result = with_arena(|arena| arena.has_key(value.id(), key).map(flag));
    record("jsafe_has_key", result, -1)
}

fn kind_of(value: JsafeValue) -> Option<Kind> {
    set_last(JsafeStatus::Ok);
    with_arena(|arena| arena.kind(value.id()))
}

/// `1` if `value` refers to a live value. `0` for the absent handle and for
/// released handles. Safe on any handle.
#[no_mangle]
pub extern "C" fn jsafe_is_valid(value: JsafeValue) -> c_int {
    flag(kind_of(value).is_some())
}

#[no_mangle]
pub extern "C" fn jsafe_is_null(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Null))
}

#[no_mangle]
pub extern "C" fn jsafe_is_bool(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Bool))
}

#[no_mangle]
pub extern "C" fn jsafe_is_num(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Number))
}

#[no_mangle]
pub extern "C" fn jsafe_is_text(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Text))
}

#[no_mangle]
pub extern "C" fn jsafe_is_obj(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Object))
}

#[no_mangle]
pub extern "C" fn jsafe_is_arr(value: JsafeValue) -> c_int {
    flag(kind_of(value) == Some(Kind::Array))
}

// === Release ===

/// Releases a caller-owned value and everything it owns. Borrowed handles
/// are rejected with `NotRoot`; released ones with `InvalidHandle`.
#[no_mangle]
pub extern "C" fn jsafe_free_value(value: JsafeValue) -> JsafeStatus {
    let result = with_arena(|arena| arena.free(value.id()));
    status_of("jsafe_free_value", result)
}

/// Releases a string returned by `jsafe_to_string` / `jsafe_to_pretty`.
#[no_mangle]
pub extern "C" fn jsafe_free_string(handle: JsafeStringHandle) -> JsafeStatus {
    let result = with_arena(|arena| arena.free_string(StringId::from_raw(handle.0)));
    status_of("jsafe_free_string", result)
}

/// Releases every outstanding value and string. Safe to call at any time and
/// any number of times; every handle issued earlier becomes invalid.
#[no_mangle]
pub extern "C" fn jsafe_cleanup() {
    let report = with_arena(|arena| arena.sweep());
    if report.values > 0 || report.strings > 0 {
        tracing::debug!(
            values = report.values,
            strings = report.strings,
            "cleanup reclaimed outstanding allocations"
        );
    }
    set_last(JsafeStatus::Ok);
}

// === Diagnostics ===

/// Status of the most recent call on this thread.
#[no_mangle]
pub extern "C" fn jsafe_last_status() -> JsafeStatus {
    status::last()
}

/// Static description of a status code. Unknown codes get a generic message.
#[no_mangle]
pub extern "C" fn jsafe_status_message(code: c_int) -> *const c_char {
    let status = match code {
        0 => JsafeStatus::Ok,
        1 => JsafeStatus::InvalidHandle,
        2 => JsafeStatus::TypeMismatch,
        3 => JsafeStatus::NullPointer,
        4 => JsafeStatus::AlreadyOwned,
        5 => JsafeStatus::Cycle,
        6 => JsafeStatus::NotRoot,
        _ => return b"unknown status\0".as_ptr().cast(),
    };
    status.message_ptr()
}

#[no_mangle]
pub extern "C" fn jsafe_stats() -> JsafeStats {
    let stats = with_arena(|arena| arena.stats());
    JsafeStats {
        live_values: stats.live_values,
        live_strings: stats.live_strings,
        roots: stats.roots,
    }
}

/// Library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn jsafe_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}
