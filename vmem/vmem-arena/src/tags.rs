//! Boundary-tag pool.
//!
//! Tags are slots in a fixed array, linked into lists by slot index. A tag
//! is on exactly one list at a time: an arena's free list, an arena's used
//! list, or the pool's own free-slot list. List heads live with their
//! owners; the surgery that keeps `prev`/`next` symmetric lives here.

use crate::TAG_CAPACITY;
use log::debug;
use vmem_span::Span;

/// Index of a slot in the boundary-tag pool.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct TagRef(usize);

impl TagRef {
    #[inline]
    const fn index(self) -> usize {
        self.0
    }
}

/// One extent of the resource plus its list links.
#[derive(Copy, Clone)]
struct TagSlot {
    span: Span,
    next: Option<TagRef>,
    prev: Option<TagRef>,
}

impl TagSlot {
    const VACANT: Self = Self {
        span: Span::EMPTY,
        next: None,
        prev: None,
    };
}

/// The fixed pool all boundary tags come from.
///
/// No heap exists when arenas are built, so the pool never grows; running
/// out is fatal. Slots return on [`release`](Self::release) and recycle
/// most-recently-freed first.
pub(crate) struct TagTable {
    slots: [TagSlot; TAG_CAPACITY],
    /// Head of the free-slot list, threaded through `next`.
    free: Option<TagRef>,
    /// Lazily set on the first [`ensure_init`](Self::ensure_init).
    initialized: bool,
}

impl TagTable {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [TagSlot::VACANT; TAG_CAPACITY],
            free: None,
            initialized: false,
        }
    }

    /// Link every slot into the free-slot list. Idempotent.
    pub(crate) fn ensure_init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        for i in (0..self.slots.len()).rev() {
            self.slots[i].next = self.free;
            self.free = Some(TagRef(i));
        }
        assert!(self.free.is_some(), "vmem: tag pool empty after init");
        debug!("vmem: boundary tag pool ready ({TAG_CAPACITY} slots)");
    }

    /// Take a slot off the free-slot list and point it at `span`.
    ///
    /// # Panics
    /// When the pool is exhausted; callers sized their workload wrong and
    /// there is nothing sensible to hand back.
    pub(crate) fn acquire(&mut self, span: Span) -> TagRef {
        debug_assert!(self.initialized, "tag pool used before init");
        let Some(idx) = self.free else {
            panic!("vmem: out of boundary tags");
        };
        self.free = self.slots[idx.index()].next;
        self.slots[idx.index()] = TagSlot {
            span,
            next: None,
            prev: None,
        };
        idx
    }

    /// Return an already-unlinked slot to the pool.
    pub(crate) fn release(&mut self, idx: TagRef) {
        let slot = &mut self.slots[idx.index()];
        debug_assert!(slot.next.is_none() && slot.prev.is_none(), "releasing a linked tag");
        slot.span = Span::EMPTY;
        slot.next = self.free;
        self.free = Some(idx);
    }

    #[inline]
    pub(crate) const fn span(&self, idx: TagRef) -> Span {
        self.slots[idx.index()].span
    }

    #[inline]
    pub(crate) const fn set_span(&mut self, idx: TagRef, span: Span) {
        self.slots[idx.index()].span = span;
    }

    #[inline]
    pub(crate) const fn next(&self, idx: TagRef) -> Option<TagRef> {
        self.slots[idx.index()].next
    }

    #[inline]
    pub(crate) const fn prev(&self, idx: TagRef) -> Option<TagRef> {
        self.slots[idx.index()].prev
    }

    /// Remove `idx` from the list owning it, fixing `head` when `idx` was
    /// the first element. The slot's own links are cleared.
    pub(crate) fn unlink(&mut self, head: &mut Option<TagRef>, idx: TagRef) {
        let TagSlot { prev, next, .. } = self.slots[idx.index()];
        match prev {
            Some(p) => self.slots[p.index()].next = next,
            None => {
                debug_assert_eq!(*head, Some(idx), "unlinking a tag the list does not hold");
                *head = next;
            }
        }
        if let Some(n) = next {
            self.slots[n.index()].prev = prev;
        }
        let slot = &mut self.slots[idx.index()];
        slot.next = None;
        slot.prev = None;
    }

    /// Link `idx` after `after`, or at the head for `after == None`.
    pub(crate) fn insert_after(
        &mut self,
        head: &mut Option<TagRef>,
        after: Option<TagRef>,
        idx: TagRef,
    ) {
        match after {
            None => {
                let old = *head;
                self.slots[idx.index()].prev = None;
                self.slots[idx.index()].next = old;
                if let Some(o) = old {
                    self.slots[o.index()].prev = Some(idx);
                }
                *head = Some(idx);
            }
            Some(a) => {
                let n = self.slots[a.index()].next;
                self.slots[idx.index()].prev = Some(a);
                self.slots[idx.index()].next = n;
                self.slots[a.index()].next = Some(idx);
                if let Some(n) = n {
                    self.slots[n.index()].prev = Some(idx);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn push_front(&mut self, head: &mut Option<TagRef>, idx: TagRef) {
        self.insert_after(head, None, idx);
    }

    /// Walk a list from `head` in link order.
    pub(crate) const fn iter(&self, head: Option<TagRef>) -> TagIter<'_> {
        TagIter {
            table: self,
            cursor: head,
        }
    }

    #[cfg(test)]
    fn free_slots(&self) -> usize {
        self.iter(self.free).count()
    }
}

pub(crate) struct TagIter<'a> {
    table: &'a TagTable,
    cursor: Option<TagRef>,
}

impl Iterator for TagIter<'_> {
    type Item = (TagRef, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        self.cursor = self.table.next(idx);
        Some((idx, self.table.span(idx)))
    }
}
