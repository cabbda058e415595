//! # Segment Arena Allocator
//!
//! Boundary-tag allocation over any 64-bit resource: physical address
//! ranges, virtual address windows, interrupt vectors, IDs. This is the
//! first allocator a kernel brings up, so it allocates nothing itself;
//! every structure lives in fixed pools inside one [`Vmem`] context.
//!
//! ## What you get
//! - Named arenas over `[base, base + size)` [`Span`]s with a per-arena
//!   allocation quantum.
//! - [`create`](Vmem::create) / [`add`](Vmem::add) to stand arenas up and
//!   donate resource to them, with authoritative-span semantics: donated
//!   ranges absorb whatever they overlap and merge with their neighbors.
//! - [`alloc`](Vmem::alloc) (next-fit, quantum-rounded) and
//!   [`free`](Vmem::free) with exact-base matching.
//! - [`stats`](Vmem::stats), segment iterators, and a [`dump`](Vmem::dump)
//!   that reports through `log`.
//! - [`LockedVmem`], the same API behind one spin lock for concurrent use.
//!
//! ## The tag model
//!
//! Every extent is a boundary tag in one of two per-arena lists:
//!
//! ```text
//! arena "kmem" (quantum 0x1000)
//!   free: [0x1000,0x5000) -> [0x9000,0xA000)     sorted, coalesced
//!   used: [0x8000,0x9000) -> [0x5000,0x8000)     newest first
//! ```
//!
//! Tags are slots in a fixed pool, linked by index; the pool and the
//! arena records come from the same kind of fixed table. Exhausting a
//! pool is a panic: the allocator underpins everything else, so there is
//! nobody left to return an error to. Running out of *resource* is
//! ordinary and surfaces as `None`.
//!
//! ## Example
//!
//! ```rust
//! use vmem_arena::{AllocPolicy, Span, Vmem};
//!
//! let mut vm = Vmem::new();
//! let kmem = vm.create("kmem", Span::new(0x100_0000, 0x10_0000), 0x1000);
//!
//! let page = vm.alloc(kmem, 1, AllocPolicy::NextFit).unwrap();
//! assert_eq!(page, 0x100_0000);
//!
//! vm.free(kmem, page).unwrap();
//! assert_eq!(vm.stats(kmem).free, 0x10_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod arena;
mod locked;
mod name;
mod tags;
mod vmem;

pub use arena::ArenaRef;
pub use locked::LockedVmem;
pub use name::ArenaName;
pub use vmem::{AllocPolicy, ArenaStats, FreeError, Vmem};
pub use vmem_span::{Span, round_up};

/// Boundary tags available per context.
///
/// Both pools are sized once and never grow; the counts are the classic
/// page-of-structures sizing for a boundary-tag allocator.
pub const TAG_CAPACITY: usize = 128;

/// Arena records available per context.
pub const ARENA_CAPACITY: usize = 73;

const _: () = assert!(TAG_CAPACITY >= 2, "splitting a tag needs a second slot");
const _: () = assert!(ARENA_CAPACITY >= 1, "a context without arenas is useless");
