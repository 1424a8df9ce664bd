//! Core of jsafe: JSON value trees with single, explicit ownership.
//!
//! Every value lives in an [`Arena`] and is addressed by an opaque
//! [`ValueId`]. A value is owned either by the caller (a root) or by exactly
//! one container; attaching moves ownership, releasing a root releases its
//! subtree, and [`Arena::sweep`] reclaims whatever is left.
//!
//! # Example
//!
//! ```
//! use jsafe_core::Arena;
//!
//! let mut arena = Arena::new();
//! let obj = arena.new_object();
//! let one = arena.new_number(1.0);
//! arena.set(obj, b"a", one).unwrap();
//!
//! let arr = arena.new_array();
//! for v in [arena.new_bool(true), arena.new_null(), arena.new_text(b"x")] {
//!     arena.push(arr, v).unwrap();
//! }
//! arena.set(obj, b"b", arr).unwrap();
//!
//! let out = arena.serialize(obj).unwrap();
//! assert_eq!(arena.string(out).unwrap().as_bytes(), br#"{"a":1,"b":[true,null,"x"]}"#);
//!
//! arena.free(obj).unwrap();
//! arena.free_string(out).unwrap();
//! assert_eq!(arena.stats().live_values, 0);
//! ```

pub mod alloc;
pub mod arena;
pub mod error;
pub mod handle;
pub mod serialize;
mod slots;
pub mod store;
pub mod text;
pub mod value;

pub use arena::{Arena, ArenaConfig, ArenaStats, SweepReport};
pub use error::{AllocError, Error, Expected, Result};
pub use handle::{StringId, ValueId};
pub use serialize::{encoded_len, to_vec, to_vec_pretty, Indent, JsonEncoder, PrettyOptions};
pub use store::{ArrayStore, ObjectStore};
pub use text::Text;
pub use value::{Kind, Value};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
