//! Interned identifiers with O(1) equality and copy.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned identifier: a component name, port name, instance name, or
/// generator variable.
///
/// Represented as a `u32` index into the session's [`Interner`], which makes
/// equality comparison and copying trivial. The same spelling always interns
/// to the same `Ident` within one session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index.
    ///
    /// Intended for deserialization and tests; normal code obtains idents
    /// through [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw interner index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits in `usize` on supported
// platforms; `try_from_usize` rejects indices that do not fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// The session-wide string interner.
///
/// Every name the compiler touches — ports, instances, components, module
/// names, generator variables — goes through here once and is an [`Ident`]
/// afterwards. Backed by [`lasso::ThreadedRodeo`] so the sink-driven pipeline
/// stages can intern from any thread.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning its [`Ident`]. Re-interning an already-known
    /// string returns the existing ident without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its spelling.
    ///
    /// # Panics
    ///
    /// Panics if the ident did not come from this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
