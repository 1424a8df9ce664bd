//! Opaque ids for arena slots.
//!
//! An id packs `(generation, slot + 1)` into a `u64`. Raw `0` is never issued,
//! which leaves it free to act as the absent sentinel at the boundary.

use std::fmt;

/// Packed slot address shared by [`ValueId`] and [`StringId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RawId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl RawId {
    pub(crate) fn pack(self) -> u64 {
        (u64::from(self.generation) << 32) | (u64::from(self.slot) + 1)
    }

    pub(crate) fn unpack(raw: u64) -> Option<Self> {
        let low = (raw & 0xffff_ffff) as u32;
        if low == 0 {
            return None;
        }
        Some(Self {
            slot: low - 1,
            generation: (raw >> 32) as u32,
        })
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Rebuilds an id from its boundary representation.
            ///
            /// Any `u64` is accepted; unknown or stale ids are rejected later by
            /// the arena rather than here.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Boundary representation of this id.
            pub const fn into_raw(self) -> u64 {
                self.0
            }

            pub(crate) fn from_parts(raw: RawId) -> Self {
                Self(raw.pack())
            }

            pub(crate) fn parts(self) -> Option<RawId> {
                RawId::unpack(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.parts() {
                    Some(raw) => write!(f, "{}({}v{})", stringify!($name), raw.slot, raw.generation),
                    None => write!(f, "{}(absent)", stringify!($name)),
                }
            }
        }
    };
}

opaque_id!(
    /// Id of a value node. Ids handed out for children are borrowed: they
    /// confer no ownership and go stale when the owning tree is released.
    ValueId
);

opaque_id!(
    /// Id of a caller-owned serialized string.
    StringId
);

impl ValueId {
    /// Result of a lookup that found nothing. Never refers to a live value.
    pub const ABSENT: ValueId = ValueId(0);

    /// Whether this is the [`ValueId::ABSENT`] sentinel.
    pub fn is_absent(self) -> bool {
        self.0 == 0
    }
}
