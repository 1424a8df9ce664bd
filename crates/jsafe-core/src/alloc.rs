//! Fatal allocation channel.
//!
//! Every value kind already has meaningful return values, so a failed
//! allocation cannot be reported in-band. It is logged and the process aborts.

use crate::error::AllocError;

/// Logs `err` and aborts. Used for every allocation the arena performs.
#[cold]
pub fn fatal(err: AllocError) -> ! {
    tracing::error!(error = %err, "allocation failed; aborting");
    std::process::abort()
}

/// Unwraps an allocation result, routing failure to [`fatal`].
pub(crate) fn ensure<T>(result: Result<T, AllocError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(err),
    }
}

pub(crate) fn reserve<T>(vec: &mut Vec<T>, additional: usize, what: &'static str) -> Result<(), AllocError> {
    vec.try_reserve(additional).map_err(|_| AllocError::Exhausted {
        what,
        requested: additional,
    })
}
