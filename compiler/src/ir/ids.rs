//! Strongly typed identifier wrappers used throughout the IR store.
//!
//! Symbols and declarations are referenced by dedicated newtypes so a symbol
//! handle can never be confused with an arena slot.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            /// Construct an identifier from a raw value.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Retrieve the underlying integer value.
            pub const fn to_raw(self) -> u32 {
                self.0
            }

            pub(crate) const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Stable indirect handle naming one declaration.
    SymbolId,
    "sym#"
);
define_id!(
    /// Slot of a declaration inside the factory's arena.
    DeclId,
    "decl#"
);
define_id!(
    /// Opaque handle to an expression body owned outside the store.
    ExprId,
    "expr#"
);
