//! Arena record pool.
//!
//! Same fixed-pool shape as the tag pool, but records are never released:
//! arenas live for the lifetime of the context, so the free-slot list only
//! ever shrinks.

use crate::ARENA_CAPACITY;
use crate::name::ArenaName;
use crate::tags::TagRef;
use log::debug;

/// Handle to a created arena. Plain index; cheap to copy, never dangles
/// (records are never destroyed).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ArenaRef(usize);

impl ArenaRef {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone)]
pub(crate) struct ArenaSlot {
    pub(crate) name: ArenaName,
    pub(crate) quantum: u64,
    /// Free list, sorted by base, coalesced.
    pub(crate) free: Option<TagRef>,
    /// Used list, most recent allocation first.
    pub(crate) used: Option<TagRef>,
    /// Registry link, newest arena first.
    pub(crate) next: Option<ArenaRef>,
}

impl ArenaSlot {
    const VACANT: Self = Self {
        name: ArenaName::EMPTY,
        quantum: 0,
        free: None,
        used: None,
        next: None,
    };
}

pub(crate) struct ArenaTable {
    slots: [ArenaSlot; ARENA_CAPACITY],
    /// Head of the free-slot list, threaded through the registry link.
    free: Option<ArenaRef>,
    initialized: bool,
}

impl ArenaTable {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [ArenaSlot::VACANT; ARENA_CAPACITY],
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
            self.free = Some(ArenaRef(i));
        }
        assert!(self.free.is_some(), "vmem: arena pool empty after init");
        debug!("vmem: arena pool ready ({ARENA_CAPACITY} slots)");
    }

    /// Claim a record for a new arena.
    ///
    /// # Panics
    /// When all records are taken.
    pub(crate) fn acquire(&mut self, name: ArenaName, quantum: u64) -> ArenaRef {
        debug_assert!(self.initialized, "arena pool used before init");
        let Some(idx) = self.free else {
            panic!("vmem: out of arenas");
        };
        self.free = self.slots[idx.index()].next;
        self.slots[idx.index()] = ArenaSlot {
            name,
            quantum,
            free: None,
            used: None,
            next: None,
        };
        idx
    }

    #[inline]
    pub(crate) const fn slot(&self, idx: ArenaRef) -> &ArenaSlot {
        &self.slots[idx.index()]
    }

    #[inline]
    pub(crate) const fn slot_mut(&mut self, idx: ArenaRef) -> &mut ArenaSlot {
        &mut self.slots[idx.index()]
    }
}
