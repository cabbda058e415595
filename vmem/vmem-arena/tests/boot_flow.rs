//! A kernel-boot-shaped consumer: the largest usable region backs the
//! kernel arena, the remaining regions are donated to a user arena, and
//! early allocations are carved out before userland churns the rest.

use vmem_arena::{AllocPolicy, ArenaRef, Span, Vmem};

const PAGE: u64 = 0x1000;

/// Usable RAM windows as they would arrive from a firmware memory map,
/// deliberately out of address order.
const USABLE: [Span; 3] = [
    Span::new(0x10_0000, 64 * PAGE),
    Span::new(0x1000, 16 * PAGE),
    Span::new(0x80_0000, 8 * PAGE),
];

/// Splits the map the way early boot does: the largest window becomes the
/// kernel arena, everything else is donated to the user arena.
fn bring_up(vm: &mut Vmem) -> (ArenaRef, ArenaRef) {
    let largest = USABLE
        .iter()
        .max_by_key(|region| region.size())
        .copied()
        .unwrap();

    let kmem = vm.create("kmem", largest, PAGE);
    let umem = vm.create("umem", Span::EMPTY, PAGE);
    for region in USABLE {
        if region != largest {
            vm.add(umem, region);
        }
    }
    (kmem, umem)
}

#[test]
fn bring_up_splits_the_memory_map() {
    let mut vm = Vmem::new();
    let (kmem, umem) = bring_up(&mut vm);

    assert_eq!(vm.stats(kmem).free, 64 * PAGE);
    assert_eq!(vm.stats(umem).free, 24 * PAGE);
    assert_eq!(vm.stats(umem).free_segments, 2);

    let user: Vec<Span> = vm.free_segments(umem).collect();
    assert_eq!(user, [Span::new(0x1000, 16 * PAGE), Span::new(0x80_0000, 8 * PAGE)]);
}

#[test]
fn early_kernel_allocations_come_out_sequential() {
    let mut vm = Vmem::new();
    let (kmem, _) = bring_up(&mut vm);

    let heap = vm.alloc(kmem, 16 * PAGE, AllocPolicy::NextFit).unwrap();
    assert_eq!(heap, 0x10_0000);

    // page-table frames land back to back behind the heap
    for i in 0..4 {
        let frame = vm.alloc(kmem, PAGE, AllocPolicy::NextFit).unwrap();
        assert_eq!(frame, 0x10_0000 + (16 + i) * PAGE);
    }

    let stats = vm.stats(kmem);
    assert_eq!(stats.used, 20 * PAGE);
    assert_eq!(stats.free, 44 * PAGE);
    assert_eq!(stats.total(), 64 * PAGE);
}

#[test]
fn duplicate_map_entries_do_not_inflate_the_arena() {
    let mut vm = Vmem::new();
    let (_, umem) = bring_up(&mut vm);
    let before = vm.stats(umem);

    // firmware maps occasionally repeat a window
    vm.add(umem, Span::new(0x80_0000, 8 * PAGE));

    let after = vm.stats(umem);
    assert_eq!(after, before);
}

#[test]
fn user_storm_drains_the_arena_and_frees_restore_it() {
    let mut vm = Vmem::new();
    let (_, umem) = bring_up(&mut vm);

    let mut pages = Vec::new();
    while let Some(base) = vm.alloc(umem, PAGE, AllocPolicy::NextFit) {
        pages.push(base);
    }
    assert_eq!(pages.len(), 24);
    assert_eq!(vm.stats(umem).free, 0);
    assert_eq!(vm.stats(umem).used_segments, 24);

    let mut sorted = pages.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), pages.len(), "duplicate bases handed out");

    for base in pages {
        vm.free(umem, base).unwrap();
    }
    let restored: Vec<Span> = vm.free_segments(umem).collect();
    assert_eq!(
        restored,
        [Span::new(0x1000, 16 * PAGE), Span::new(0x80_0000, 8 * PAGE)],
        "coalescing must rebuild the original regions"
    );
}

#[test]
fn both_arenas_stay_independent_through_the_whole_flow() {
    let mut vm = Vmem::new();
    let (kmem, umem) = bring_up(&mut vm);

    let kernel_total = vm.stats(kmem).total();
    let user_total = vm.stats(umem).total();

    vm.alloc(kmem, 8 * PAGE, AllocPolicy::NextFit).unwrap();
    let user_page = vm.alloc(umem, PAGE, AllocPolicy::NextFit).unwrap();
    vm.free(umem, user_page).unwrap();

    assert_eq!(vm.stats(kmem).total(), kernel_total);
    assert_eq!(vm.stats(umem).total(), user_total);
    assert_eq!(vm.stats(umem).used, 0);

    let names: Vec<&str> = vm.arenas().map(|a| vm.name(a)).collect();
    assert_eq!(names, ["umem", "kmem"]);

    vm.dump_all();
}
