//! The allocator context and its operations.
//!
//! A [`Vmem`] owns the tag pool, the arena pool and the arena registry.
//! Each arena tracks two tag lists over one 64-bit resource:
//!
//! - the free list, sorted by base, coalesced (no two tags overlap or
//!   abut),
//! - the used list, most recent allocation first.
//!
//! [`add`](Vmem::add) treats the donated span as authoritative: whatever
//! parts of it the free list already covers are cleared first, then the
//! span goes in as one piece and merges with its neighbors. The free list
//! therefore always holds the union of everything donated minus everything
//! handed out.
//!
//! Nothing here locks; [`LockedVmem`](crate::LockedVmem) is the concurrent
//! front end.

use crate::arena::{ArenaRef, ArenaTable};
use crate::name::ArenaName;
use crate::tags::{TagRef, TagTable};
use log::{debug, info};
use vmem_span::{Span, round_up};

/// Placement policy for [`Vmem::alloc`].
///
/// Next-fit takes the first sufficiently large free tag in address order.
/// Other policies belong here if a caller ever needs them.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AllocPolicy {
    #[default]
    NextFit,
}

/// Why a [`Vmem::free`] call was rejected.
#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum FreeError {
    #[error("no used segment starts at {base:#X}")]
    NotAllocated { base: u64 },
}

/// Point-in-time usage figures for one arena.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ArenaStats {
    /// Resource units on the free list.
    pub free: u64,
    /// Resource units handed out.
    pub used: u64,
    pub free_segments: usize,
    pub used_segments: usize,
}

impl ArenaStats {
    /// Everything the arena has ever been given and not cleared away.
    #[inline]
    #[must_use]
    pub const fn total(self) -> u64 {
        self.free + self.used
    }
}

/// The allocator context: pools, registry, and every operation.
///
/// `new` is `const`; pools link themselves on the first
/// [`create`](Self::create). All storage is inline, so the context works
/// before any heap exists.
pub struct Vmem {
    tags: TagTable,
    arenas: ArenaTable,
    /// Arena registry head, newest first.
    registry: Option<ArenaRef>,
}

impl Vmem {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tags: TagTable::new(),
            arenas: ArenaTable::new(),
            registry: None,
        }
    }

    /// Create an arena named `name` with allocation granularity `quantum`,
    /// optionally seeded with an initial `span`.
    ///
    /// Passing an empty span means "no resource yet"; donate later with
    /// [`add`](Self::add). An empty span must sit at base zero.
    ///
    /// # Panics
    /// On an empty name, a zero quantum, an empty span with a nonzero
    /// base, or an exhausted pool.
    pub fn create(&mut self, name: &str, span: Span, quantum: u64) -> ArenaRef {
        assert!(!name.is_empty(), "arena name must not be empty");
        assert!(quantum >= 1, "quantum must be positive");
        assert!(
            !span.is_empty() || span.base() == 0,
            "zero-size span must sit at base zero"
        );

        self.tags.ensure_init();
        self.arenas.ensure_init();

        let handle = self.arenas.acquire(ArenaName::new(name), quantum);
        if !span.is_empty() {
            let tag = self.tags.acquire(span);
            self.arenas.slot_mut(handle).free = Some(tag);
        }

        // register newest-first
        self.arenas.slot_mut(handle).next = self.registry;
        self.registry = Some(handle);

        debug!("vmem: arena \"{name}\" created, quantum {quantum:#X}");
        handle
    }

    /// Donate `span` to the arena's free list and return its base.
    ///
    /// The span is authoritative: parts of it already free are absorbed,
    /// parts bordering existing tags merge with them. Donating a region
    /// twice is therefore harmless.
    ///
    /// # Panics
    /// When splitting or inserting needs a tag and the pool is exhausted.
    pub fn add(&mut self, arena: ArenaRef, span: Span) -> u64 {
        if span.is_empty() {
            return span.base();
        }
        self.clear_range(arena, span);
        self.insert_free(arena, span);
        self.debug_check_free(arena);
        span.base()
    }

    /// Allocate `size` resource units, rounded up to the arena's quantum.
    ///
    /// Returns the base of the new used segment, or `None` when no free
    /// tag is large enough. Running out of resource is the caller's
    /// condition to handle, unlike running out of bookkeeping space.
    ///
    /// # Panics
    /// When carving a larger tag needs a fresh one and the pool is
    /// exhausted.
    pub fn alloc(&mut self, arena: ArenaRef, size: u64, policy: AllocPolicy) -> Option<u64> {
        if size == 0 {
            return None;
        }
        let rounded = round_up(size, self.arenas.slot(arena).quantum);
        let idx = match policy {
            AllocPolicy::NextFit => self.next_fit(arena, rounded),
        }?;

        let tag = self.tags.span(idx);
        let base = tag.base();
        let slot = self.arenas.slot_mut(arena);
        if tag.size() == rounded {
            // exact fit: the whole tag changes lists
            self.tags.unlink(&mut slot.free, idx);
            self.tags.push_front(&mut slot.used, idx);
        } else {
            // carve the front; the acquire must come first or an
            // exhaustion panic strands the carved span outside both lists
            let (taken, rest) = tag.split_front(rounded);
            let used = self.tags.acquire(taken);
            self.tags.set_span(idx, rest);
            self.tags.push_front(&mut slot.used, used);
        }
        self.debug_check_free(arena);
        Some(base)
    }

    /// Return the used segment starting at exactly `base` to the free
    /// list, merging with its neighbors.
    ///
    /// # Errors
    /// [`FreeError::NotAllocated`] when no used segment starts there;
    /// double frees land here too.
    pub fn free(&mut self, arena: ArenaRef, base: u64) -> Result<(), FreeError> {
        let mut cursor = self.arenas.slot(arena).used;
        while let Some(idx) = cursor {
            let span = self.tags.span(idx);
            if span.base() == base {
                let slot = self.arenas.slot_mut(arena);
                self.tags.unlink(&mut slot.used, idx);
                self.tags.release(idx);
                self.insert_free(arena, span);
                self.debug_check_free(arena);
                return Ok(());
            }
            cursor = self.tags.next(idx);
        }
        Err(FreeError::NotAllocated { base })
    }

    /// Usage figures for one arena; one walk over each list.
    #[must_use]
    pub fn stats(&self, arena: ArenaRef) -> ArenaStats {
        let slot = self.arenas.slot(arena);
        let mut stats = ArenaStats::default();
        for (_, span) in self.tags.iter(slot.free) {
            stats.free += span.size();
            stats.free_segments += 1;
        }
        for (_, span) in self.tags.iter(slot.used) {
            stats.used += span.size();
            stats.used_segments += 1;
        }
        stats
    }

    /// Free segments in address order.
    pub fn free_segments(&self, arena: ArenaRef) -> impl Iterator<Item = Span> + '_ {
        self.tags
            .iter(self.arenas.slot(arena).free)
            .map(|(_, span)| span)
    }

    /// Used segments, most recent allocation first.
    pub fn used_segments(&self, arena: ArenaRef) -> impl Iterator<Item = Span> + '_ {
        self.tags
            .iter(self.arenas.slot(arena).used)
            .map(|(_, span)| span)
    }

    /// Registered arenas, newest first.
    pub fn arenas(&self) -> impl Iterator<Item = ArenaRef> + '_ {
        let mut cursor = self.registry;
        core::iter::from_fn(move || {
            let handle = cursor?;
            cursor = self.arenas.slot(handle).next;
            Some(handle)
        })
    }

    #[must_use]
    pub fn name(&self, arena: ArenaRef) -> &str {
        self.arenas.slot(arena).name.as_str()
    }

    #[must_use]
    pub const fn quantum(&self, arena: ArenaRef) -> u64 {
        self.arenas.slot(arena).quantum
    }

    /// Log one arena's lists and totals. Read-only.
    pub fn dump(&self, arena: ArenaRef) {
        let slot = self.arenas.slot(arena);
        info!("arena \"{}\", quantum {:#X}:", slot.name, slot.quantum);
        for (_, span) in self.tags.iter(slot.free) {
            info!("  free {span} size {:#X}", span.size());
        }
        for (_, span) in self.tags.iter(slot.used) {
            info!("  used {span} size {:#X}", span.size());
        }
        let stats = self.stats(arena);
        info!(
            "  {:#X} free in {} segment(s), {:#X} used in {} segment(s)",
            stats.free, stats.free_segments, stats.used, stats.used_segments
        );
    }

    /// [`dump`](Self::dump) every registered arena, newest first.
    pub fn dump_all(&self) {
        for arena in self.arenas() {
            self.dump(arena);
        }
    }

    /// Erase every part of `span` the free list already covers, walking
    /// tags in address order. Afterwards the span can go in as one piece.
    fn clear_range(&mut self, arena: ArenaRef, span: Span) {
        let mut remaining = span;
        let mut cursor = self.arenas.slot(arena).free;
        while let Some(idx) = cursor {
            if remaining.is_empty() {
                break;
            }
            let tag = self.tags.span(idx);
            if remaining.end() <= tag.base() {
                // nothing at or past this tag can overlap
                break;
            }
            if tag.end() <= remaining.base() {
                cursor = self.tags.next(idx);
                continue;
            }
            if tag.base() < remaining.base() {
                // left edge inside the tag: keep the head, continue at the tail
                let (head, tail) = tag.split_at(remaining.base());
                let split = self.tags.acquire(tail);
                self.tags.set_span(idx, head);
                let slot = self.arenas.slot_mut(arena);
                self.tags.insert_after(&mut slot.free, Some(idx), split);
                cursor = Some(split);
                continue;
            }
            if remaining.base() < tag.base() {
                // the gap below the tag was never covered; skip over it
                remaining = Span::from_range(tag.base(), remaining.end());
                continue;
            }
            // same base: the overlap comes off the tag's front
            let take = remaining.size().min(tag.size());
            let rest = tag.split_front(take).1;
            remaining = remaining.split_front(take).1;
            if rest.is_empty() {
                let next = self.tags.next(idx);
                let slot = self.arenas.slot_mut(arena);
                self.tags.unlink(&mut slot.free, idx);
                self.tags.release(idx);
                cursor = next;
            } else {
                self.tags.set_span(idx, rest);
            }
        }
    }

    /// Insert a span that overlaps no free tag, merging with abutting
    /// neighbors on either side.
    fn insert_free(&mut self, arena: ArenaRef, span: Span) {
        let mut prev: Option<TagRef> = None;
        let mut next = self.arenas.slot(arena).free;
        while let Some(idx) = next {
            if self.tags.span(idx).base() > span.base() {
                break;
            }
            prev = Some(idx);
            next = self.tags.next(idx);
        }

        if let Some(p) = prev {
            let prev_span = self.tags.span(p);
            debug_assert!(prev_span.end() <= span.base(), "insert into covered range");
            if prev_span.abuts(span) {
                let mut merged = prev_span.join(span);
                // growing forward may close the gap to the next tag
                if let Some(n) = next {
                    let next_span = self.tags.span(n);
                    if merged.abuts(next_span) {
                        merged = merged.join(next_span);
                        let slot = self.arenas.slot_mut(arena);
                        self.tags.unlink(&mut slot.free, n);
                        self.tags.release(n);
                    }
                }
                self.tags.set_span(p, merged);
                return;
            }
        }

        if let Some(n) = next {
            let next_span = self.tags.span(n);
            debug_assert!(span.end() <= next_span.base(), "insert into covered range");
            if span.abuts(next_span) {
                self.tags.set_span(n, span.join(next_span));
                return;
            }
        }

        let tag = self.tags.acquire(span);
        let slot = self.arenas.slot_mut(arena);
        self.tags.insert_after(&mut slot.free, prev, tag);
    }

    /// First free tag, in address order, large enough for `rounded`.
    fn next_fit(&self, arena: ArenaRef, rounded: u64) -> Option<TagRef> {
        self.tags
            .iter(self.arenas.slot(arena).free)
            .find(|(_, span)| span.size() >= rounded)
            .map(|(idx, _)| idx)
    }

    /// Free-list structural check: sorted, symmetric links, nothing
    /// empty, overlapping or abutting. Compiles to nothing in release.
    fn debug_check_free(&self, arena: ArenaRef) {
        if !cfg!(debug_assertions) {
            return;
        }
        let mut prev: Option<TagRef> = None;
        let mut cursor = self.arenas.slot(arena).free;
        while let Some(idx) = cursor {
            let span = self.tags.span(idx);
            debug_assert!(!span.is_empty(), "empty tag on the free list");
            debug_assert_eq!(self.tags.prev(idx), prev, "asymmetric links");
            if let Some(p) = prev {
                debug_assert!(
                    self.tags.span(p).end() < span.base(),
                    "free list must stay sorted, disjoint and merged"
                );
            }
            prev = cursor;
            cursor = self.tags.next(idx);
        }
    }
}

impl Default for Vmem {
    fn default() -> Self {
        Self::new()
    }
}
