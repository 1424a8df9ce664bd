use thiserror::Error;

use crate::value::Kind;

/// Recoverable failures of arena operations.
///
/// A missing key is not an error: lookups return `Ok(None)` for it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("handle does not refer to a live value")]
    InvalidHandle,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Expected, found: Kind },
    #[error("value is already owned by a container")]
    AlreadyOwned,
    #[error("attaching the value would make it its own descendant")]
    Cycle,
    #[error("value is owned by a container and cannot be released directly")]
    NotRoot,
}

pub type Result<T> = std::result::Result<T, Error>;

/// What an operation required of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Kind(Kind),
    /// Either an object or an array.
    Container,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Kind(kind) => write!(f, "{kind}"),
            Expected::Container => f.write_str("object or array"),
        }
    }
}

impl Error {
    pub(crate) fn mismatch(expected: Kind, found: Kind) -> Self {
        Error::TypeMismatch {
            expected: Expected::Kind(expected),
            found,
        }
    }
}

/// The arena could not obtain memory. Never returned to callers; see
/// [`crate::alloc::fatal`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("failed to reserve {requested} more {what}")]
    Exhausted { what: &'static str, requested: usize },
    #[error("slot table is full ({0} slots)")]
    SlotsExhausted(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_both_kinds() {
        let err = Error::mismatch(Kind::Number, Kind::Text);
        assert_eq!(err.to_string(), "type mismatch: expected number, found string");

        let err = Error::TypeMismatch {
            expected: Expected::Container,
            found: Kind::Bool,
        };
        assert_eq!(
            err.to_string(),
            "type mismatch: expected object or array, found boolean"
        );
    }
}
