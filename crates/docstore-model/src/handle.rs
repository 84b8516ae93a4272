//! Opaque client-facing handles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque 128-bit identifier for a server-side open collection or resource.
///
/// A handle carries no semantic meaning beyond identity. On the wire it is
/// represented as two 64-bit words (most/least significant halves).
///
/// Collection handles and resource handles share this type but live in
/// separate registry maps; a handle from one space never resolves in the
/// other.
///
/// # Examples
///
/// ```
/// use docstore_model::Handle;
///
/// let handle = Handle::from_halves(0xDEAD_BEEF, 0xCAFE);
/// assert_eq!(handle.most_significant(), 0xDEAD_BEEF);
/// assert_eq!(handle.least_significant(), 0xCAFE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    /// Most significant 64 bits.
    msb: u64,
    /// Least significant 64 bits.
    lsb: u64,
}

impl Handle {
    /// Reassemble a handle from its two wire-level halves.
    #[must_use]
    pub fn from_halves(msb: u64, lsb: u64) -> Self {
        Self { msb, lsb }
    }

    /// The most significant 64 bits of the handle.
    #[must_use]
    pub fn most_significant(&self) -> u64 {
        self.msb
    }

    /// The least significant 64 bits of the handle.
    #[must_use]
    pub fn least_significant(&self) -> u64 {
        self.lsb
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.msb, self.lsb)
    }
}
