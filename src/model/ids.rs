//! Typed indices into the program model arenas.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of this id in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// A syntax node.
    NodeId
);
arena_id!(
    /// A source file of the compilation.
    FileId
);
arena_id!(
    /// A (non-global) namespace.
    NamespaceId
);
arena_id!(
    /// A named type, declared in source or referenced from another assembly.
    TypeId
);
arena_id!(
    /// A method, constructor, local function or anonymous function.
    MethodId
);
arena_id!(PropertyId);
arena_id!(EventId);
