//! Member identities and the allocator that issues them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Minimum number of decimal digits in a rendered member ID.
pub const MEMBER_ID_WIDTH: usize = 5;

/// Identity of a connected chat member.
///
/// Wraps a zero-padded decimal string (e.g., "00042"). Issued once per
/// connection by [`IdAllocator`] and never reused for the lifetime of the
/// process. Callers should treat the value as opaque and rely only on
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MemberId(String);

impl MemberId {
    /// Creates a MemberId from a string.
    ///
    /// Used when resolving a target typed by a client. No format validation
    /// is performed; an ID that was never issued simply won't resolve.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Renders a counter value in the fixed-width form.
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{seq:0width$}", width = MEMBER_ID_WIDTH))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Allocator
// ============================================================================

/// Issues unique member IDs.
///
/// Backed by a single atomic counter, so concurrent callers never observe
/// a lost or duplicated value. The first ID issued is `00001`.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator whose first ID is `00001`.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns a fresh ID, distinct from every ID issued before.
    pub fn next_id(&self) -> MemberId {
        // Only uniqueness matters here; no other memory is published with the counter.
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        MemberId::from_sequence(seq)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
