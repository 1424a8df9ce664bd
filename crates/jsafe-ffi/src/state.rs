//! Process-wide arena behind the C surface.
//!
//! The arena is created on the first call and lives until process exit.
//! `jsafe_cleanup` sweeps it but keeps it around, so handles issued before
//! the sweep stay detectably stale instead of aliasing new values.

use std::env;

use jsafe_core::{Arena, ArenaConfig};
use parking_lot::{const_mutex, Mutex};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// `EnvFilter` directive enabling stderr logging, e.g. `jsafe=debug`.
pub const LOG_ENV: &str = "JSAFE_LOG";
/// Initial value slot reservation.
pub const VALUE_CAPACITY_ENV: &str = "JSAFE_VALUE_CAPACITY";
/// Initial serialized-string slot reservation.
pub const STRING_CAPACITY_ENV: &str = "JSAFE_STRING_CAPACITY";

static ARENA: Mutex<Option<Arena>> = const_mutex(None);

/// Runs `f` with exclusive access to the arena, creating it on first use.
pub(crate) fn with_arena<R>(f: impl FnOnce(&mut Arena) -> R) -> R {
    let mut guard = ARENA.lock();
    let arena = guard.get_or_insert_with(init);
    f(arena)
}

fn init() -> Arena {
    init_logging();
    let config = config_from(|name| env::var(name).ok());
    debug!(?config, "arena initialised");
    Arena::with_config(&config)
}

fn init_logging() {
    let Ok(directive) = env::var(LOG_ENV) else {
        return;
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    // The host may already have installed a subscriber; keep theirs.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn config_from(lookup: impl Fn(&str) -> Option<String>) -> ArenaConfig {
    let mut config = ArenaConfig::default();
    if let Some(n) = capacity(VALUE_CAPACITY_ENV, lookup(VALUE_CAPACITY_ENV)) {
        config = config.with_value_capacity(n);
    }
    if let Some(n) = capacity(STRING_CAPACITY_ENV, lookup(STRING_CAPACITY_ENV)) {
        config = config.with_string_capacity(n);
    }
    config
}

fn capacity(name: &str, raw: Option<String>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable capacity");
            None
        }
    }
}
