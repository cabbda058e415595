//! # Resource Spans
//!
//! The value type the arena allocator computes with: a half-open interval
//! `[base, base + size)` over a 64-bit resource (addresses, offsets, IDs).
//!
//! ## Overview
//!
//! Every boundary tag covers exactly one [`Span`]. All of the allocator's
//! list surgery reduces to a handful of interval operations, so they live
//! here, `const` and branch-light, with the orderings and predicates the
//! coalescing code depends on:
//!
//! - [`precedes`](Span::precedes) / [`overlaps`](Span::overlaps) /
//!   [`abuts`](Span::abuts) classify the relation between two spans.
//! - [`split_at`](Span::split_at) / [`split_front`](Span::split_front) carve
//!   a span for range clearing and allocation.
//! - [`join`](Span::join) fuses two abutting spans back into one.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use vmem_span::Span;
//! let free = Span::new(0x1000, 0x3000);
//!
//! // carve an allocation off the front
//! let (taken, rest) = free.split_front(0x800);
//! assert_eq!(taken, Span::new(0x1000, 0x800));
//! assert_eq!(rest, Span::new(0x1800, 0x2800));
//!
//! // adjacency is what makes the pieces mergeable again
//! assert!(taken.abuts(rest));
//! assert_eq!(taken.join(rest), free);
//! ```
//!
//! ## Design Notes
//!
//! - `Span` is `Copy`, ordered by `(base, size)`, and hashable; free lists
//!   sorted by base come out of the derived `Ord` for free.
//! - Sizes are rounded with [`round_up`], which accepts any quantum >= 1,
//!   not only powers of two.
//! - Overflow of `base + size` is a caller error; the allocator only ever
//!   handles spans its callers donated.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

use core::fmt;

/// A half-open interval `[base, base + size)` of a 64-bit resource.
///
/// ### Semantics
/// - `size == 0` means the span covers nothing; `base` is then meaningless.
/// - `end()` is one past the last covered unit.
///
/// ### Invariants
/// - `base + size` does not overflow `u64` (callers guarantee this; the
///   arithmetic here is debug-checked only).
///
/// ### Examples
/// ```rust
/// # use vmem_span::Span;
/// let s = Span::new(5, 5);
/// assert_eq!(s.end(), 10);
/// assert!(s.contains(9));
/// assert!(!s.contains(10));
/// ```
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Span {
    base: u64,
    size: u64,
}

impl Span {
    /// The empty span at base zero.
    pub const EMPTY: Self = Self::new(0, 0);

    #[inline]
    #[must_use]
    pub const fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    /// Span covering `[base, end)`. Debug-panics if `end < base`.
    #[inline]
    #[must_use]
    pub const fn from_range(base: u64, end: u64) -> Self {
        debug_assert!(base <= end, "inverted range");
        Self::new(base, end - base)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> u64 {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn size(self) -> u64 {
        self.size
    }

    /// One past the last covered unit.
    #[inline]
    #[must_use]
    pub const fn end(self) -> u64 {
        self.base + self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.size == 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, addr: u64) -> bool {
        self.base <= addr && addr < self.end()
    }

    /// `self` ends at or before `other` begins. Empty spans precede
    /// everything at or after their base.
    #[inline]
    #[must_use]
    pub const fn precedes(self, other: Self) -> bool {
        self.end() <= other.base
    }

    /// The intersection is non-empty. Empty spans overlap nothing,
    /// wherever their base sits.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.base < other.end() && other.base < self.end()
    }

    /// `self` ends exactly where `other` begins. Two free tags in this
    /// relation must not coexist; the allocator merges them on sight.
    #[inline]
    #[must_use]
    pub const fn abuts(self, other: Self) -> bool {
        self.end() == other.base
    }

    /// Split into `[base, addr)` and `[addr, end)`.
    /// Debug-panics unless `addr` lies within the span.
    #[inline]
    #[must_use]
    pub const fn split_at(self, addr: u64) -> (Self, Self) {
        debug_assert!(self.base <= addr && addr <= self.end(), "split outside span");
        (
            Self::from_range(self.base, addr),
            Self::from_range(addr, self.end()),
        )
    }

    /// Split into the first `n` units and the remainder.
    /// Debug-panics if `n` exceeds the size.
    #[inline]
    #[must_use]
    pub const fn split_front(self, n: u64) -> (Self, Self) {
        debug_assert!(n <= self.size, "span too small");
        self.split_at(self.base + n)
    }

    /// Fuse with the abutting span that follows this one.
    /// Debug-panics if the spans do not abut.
    #[inline]
    #[must_use]
    pub const fn join(self, next: Self) -> Self {
        debug_assert!(self.end() == next.base, "spans do not abut");
        Self::new(self.base, self.size + next.size)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#X}, {:#X})", self.base, self.end())
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Span([{:#X}, {:#X}) size {:#X})",
            self.base,
            self.end(),
            self.size
        )
    }
}

impl From<(u64, u64)> for Span {
    /// `(base, size)` pairs, the shape scenario tables are written in.
    #[inline]
    fn from((base, size): (u64, u64)) -> Self {
        Self::new(base, size)
    }
}

/// Round `size` up to the next multiple of `quantum`.
///
/// Quanta are any value >= 1; arenas over non-byte resources use quanta
/// that are not powers of two, so this is `div_ceil` arithmetic rather
/// than bit masking.
///
/// ```rust
/// # use vmem_span::round_up;
/// assert_eq!(round_up(1, 4096), 4096);
/// assert_eq!(round_up(4096, 4096), 4096);
/// assert_eq!(round_up(10, 123), 123);
/// assert_eq!(round_up(0, 123), 0);
/// ```
#[inline]
#[must_use]
pub const fn round_up(size: u64, quantum: u64) -> u64 {
    debug_assert!(quantum >= 1, "quantum must be positive");
    size.div_ceil(quantum) * quantum
}
