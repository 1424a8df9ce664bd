//! Status codes and the per-thread last-status slot.

use std::cell::Cell;
use std::os::raw::c_char;

use jsafe_core::Error;

/// Outcome of an FFI call.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsafeStatus {
    /// Success (no error)
    Ok = 0,
    /// Handle is absent, stale, or was never issued
    InvalidHandle = 1,
    /// Value has the wrong kind for the operation
    TypeMismatch = 2,
    /// A required pointer argument was null
    NullPointer = 3,
    /// Value already belongs to a container
    AlreadyOwned = 4,
    /// Attaching would make a value its own descendant
    Cycle = 5,
    /// Value belongs to a container and cannot be freed directly
    NotRoot = 6,
}

impl From<Error> for JsafeStatus {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidHandle => JsafeStatus::InvalidHandle,
            Error::TypeMismatch { .. } => JsafeStatus::TypeMismatch,
            Error::AlreadyOwned => JsafeStatus::AlreadyOwned,
            Error::Cycle => JsafeStatus::Cycle,
            Error::NotRoot => JsafeStatus::NotRoot,
        }
    }
}

impl JsafeStatus {
    /// Static, NUL-terminated description.
    pub(crate) fn message(self) -> &'static [u8] {
        match self {
            JsafeStatus::Ok => b"ok\0",
            JsafeStatus::InvalidHandle => b"handle does not refer to a live value\0",
            JsafeStatus::TypeMismatch => b"value has the wrong kind for this operation\0",
            JsafeStatus::NullPointer => b"null pointer argument\0",
            JsafeStatus::AlreadyOwned => b"value is already owned by a container\0",
            JsafeStatus::Cycle => b"attaching the value would make it its own descendant\0",
            JsafeStatus::NotRoot => b"value is owned by a container and cannot be freed directly\0",
        }
    }

    pub(crate) fn message_ptr(self) -> *const c_char {
        self.message().as_ptr().cast()
    }
}

thread_local! {
    static LAST_STATUS: Cell<JsafeStatus> = const { Cell::new(JsafeStatus::Ok) };
}

pub(crate) fn set_last(status: JsafeStatus) -> JsafeStatus {
    LAST_STATUS.with(|last| last.set(status));
    status
}

pub(crate) fn last() -> JsafeStatus {
    LAST_STATUS.with(Cell::get)
}

/// Records the outcome of `result` and returns its value, or `fallback` on
/// error.
pub(crate) fn record<T>(op: &'static str, result: Result<T, Error>, fallback: T) -> T {
    match result {
        Ok(value) => {
            set_last(JsafeStatus::Ok);
            value
        }
        Err(err) => {
            fail(op, err);
            fallback
        }
    }
}

/// Records the outcome of a call that returns only a status.
pub(crate) fn status_of(op: &'static str, result: Result<(), Error>) -> JsafeStatus {
    match result {
        Ok(()) => set_last(JsafeStatus::Ok),
        Err(err) => fail(op, err),
    }
}

fn fail(op: &'static str, err: Error) -> JsafeStatus {
    // Kind checks are part of normal control flow for most hosts.
    if matches!(err, Error::TypeMismatch { .. }) {
        tracing::debug!(op, error = %err, "jsafe call failed");
    } else {
        tracing::warn!(op, error = %err, "jsafe call failed");
    }
    set_last(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsafe_core::{Expected, Kind};

    #[test]
    fn errors_map_to_stable_codes() {
        let mismatch = Error::TypeMismatch {
            expected: Expected::Kind(Kind::Number),
            found: Kind::Null,
        };
        assert_eq!(JsafeStatus::from(mismatch), JsafeStatus::TypeMismatch);
        assert_eq!(JsafeStatus::from(Error::NotRoot) as i32, 6);
    }

    #[test]
    fn messages_are_nul_terminated() {
        for status in [
            JsafeStatus::Ok,
            JsafeStatus::InvalidHandle,
            JsafeStatus::TypeMismatch,
            JsafeStatus::NullPointer,
            JsafeStatus::AlreadyOwned,
            JsafeStatus::Cycle,
            JsafeStatus::NotRoot,
        ] {
            let msg = status.message();
            assert_eq!(msg.last(), Some(&0));
            assert_eq!(msg.iter().filter(|&&b| b == 0).count(), 1);
        }
    }

    #[test]
    fn record_sets_last_status() {
        assert_eq!(record("test", Err::<u32, _>(Error::Cycle), 7), 7);
        assert_eq!(last(), JsafeStatus::Cycle);
        assert_eq!(record("test", Ok(1u32), 7), 1);
        assert_eq!(last(), JsafeStatus::Ok);
    }

    #[test]
    fn status_of_returns_what_it_records() {
        assert_eq!(status_of("test", Err(Error::NotRoot)), JsafeStatus::NotRoot);
        assert_eq!(last(), JsafeStatus::NotRoot);
        assert_eq!(status_of("test", Ok(())), JsafeStatus::Ok);
        assert_eq!(last(), JsafeStatus::Ok);
    }
}
