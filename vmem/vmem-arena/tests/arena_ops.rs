//! Cross-operation behavior through the public API: donation shapes,
//! next-fit placement, free-and-merge cycles, and the locked facade under
//! real threads.

use vmem_arena::{AllocPolicy, ArenaRef, LockedVmem, Span, Vmem};

fn assert_free_segments(vm: &Vmem, arena: ArenaRef, expected: &[(u64, u64)]) {
    let got: Vec<Span> = vm.free_segments(arena).collect();
    let want: Vec<Span> = expected.iter().copied().map(Span::from).collect();
    assert_eq!(got, want);
}

#[test]
fn donation_to_a_fresh_arena_becomes_the_sole_tag() {
    let mut vm = Vmem::new();
    let a = vm.create("a", Span::EMPTY, 4096);
    assert_eq!(vm.add(a, Span::new(5, 5)), 5);
    assert_free_segments(&vm, a, &[(5, 5)]);
}

#[test]
fn overlapping_donation_extends_the_existing_tag() {
    let mut vm = Vmem::new();
    let b = vm.create("b", Span::new(0, 5), 4096);
    vm.add(b, Span::new(4, 2));
    assert_free_segments(&vm, b, &[(0, 6)]);
}

#[test]
fn disjoint_donation_gets_its_own_tag() {
    let mut vm = Vmem::new();
    let b = vm.create("b", Span::new(0, 5), 4096);
    vm.add(b, Span::new(10, 5));
    assert_free_segments(&vm, b, &[(0, 5), (10, 5)]);
}

#[test]
fn spanning_donation_swallows_everything_it_covers() {
    let mut vm = Vmem::new();
    let d = vm.create("d", Span::new(0, 5), 4096);
    vm.add(d, Span::new(8, 2));
    vm.add(d, Span::new(3, 12));
    assert_free_segments(&vm, d, &[(0, 15)]);
}

#[test]
fn abutting_donation_merges_with_its_neighbor() {
    let mut vm = Vmem::new();
    let d = vm.create("d", Span::new(0, 5), 4096);
    vm.add(d, Span::new(8, 2));
    vm.add(d, Span::new(10, 2));
    assert_free_segments(&vm, d, &[(0, 5), (8, 4)]);
}

#[test]
fn donations_commute_to_the_same_coverage() {
    let mut vm = Vmem::new();
    let spans = [Span::new(3, 4), Span::new(0, 5), Span::new(9, 2), Span::new(5, 4)];

    let fwd = vm.create("fwd", Span::EMPTY, 1);
    for s in spans {
        vm.add(fwd, s);
    }
    let rev = vm.create("rev", Span::EMPTY, 1);
    for s in spans.iter().rev() {
        vm.add(rev, *s);
    }

    let f: Vec<_> = vm.free_segments(fwd).collect();
    let r: Vec<_> = vm.free_segments(rev).collect();
    assert_eq!(f, r);
    assert_free_segments(&vm, fwd, &[(0, 11)]);
}

#[test]
fn next_fit_walks_past_small_tags_and_carves_the_first_match() {
    let mut vm = Vmem::new();
    let a = vm.create("a", Span::new(0, 3), 1);
    vm.add(a, Span::new(8, 2));
    vm.add(a, Span::new(16, 8));

    // only the last tag fits
    assert_eq!(vm.alloc(a, 5, AllocPolicy::NextFit), Some(16));
    assert_free_segments(&vm, a, &[(0, 3), (8, 2), (21, 3)]);

    // the first tag satisfies a small request
    assert_eq!(vm.alloc(a, 2, AllocPolicy::NextFit), Some(0));
    assert_free_segments(&vm, a, &[(2, 1), (8, 2), (21, 3)]);
}

#[test]
fn alloc_free_cycles_restore_the_original_coverage() {
    let mut vm = Vmem::new();
    let a = vm.create("a", Span::new(0x1000, 0x8000), 0x1000);
    let before: Vec<_> = vm.free_segments(a).collect();

    let mut bases = Vec::new();
    while let Some(base) = vm.alloc(a, 0x1000, AllocPolicy::NextFit) {
        bases.push(base);
    }
    assert_eq!(bases.len(), 8);
    assert_eq!(vm.stats(a).free, 0);

    // free in a scattered order; coalescing must still converge
    for base in [bases[3], bases[0], bases[7], bases[1], bases[5], bases[2], bases[6], bases[4]] {
        vm.free(a, base).unwrap();
    }
    let after: Vec<_> = vm.free_segments(a).collect();
    assert_eq!(after, before);
}

#[test]
fn quantum_rounding_isolates_arenas_with_different_granularity() {
    let mut vm = Vmem::new();
    let pages = vm.create("pages", Span::new(0, 0x10_000), 0x1000);
    let bytes = vm.create("bytes", Span::new(0, 0x10_000), 1);

    assert_eq!(vm.alloc(pages, 1, AllocPolicy::NextFit), Some(0));
    assert_eq!(vm.alloc(bytes, 1, AllocPolicy::NextFit), Some(0));
    assert_eq!(vm.stats(pages).used, 0x1000);
    assert_eq!(vm.stats(bytes).used, 1);
}

#[test]
fn stats_track_every_operation() {
    let mut vm = Vmem::new();
    let a = vm.create("a", Span::new(0, 64), 1);
    assert_eq!(vm.stats(a).free, 64);
    assert_eq!(vm.stats(a).free_segments, 1);

    vm.add(a, Span::new(100, 36));
    assert_eq!(vm.stats(a).total(), 100);
    assert_eq!(vm.stats(a).free_segments, 2);

    let base = vm.alloc(a, 10, AllocPolicy::NextFit).unwrap();
    let stats = vm.stats(a);
    assert_eq!((stats.free, stats.used), (90, 10));
    assert_eq!(stats.used_segments, 1);

    vm.free(a, base).unwrap();
    let stats = vm.stats(a);
    assert_eq!((stats.free, stats.used), (100, 0));
    assert_eq!(stats.used_segments, 0);
}

#[test]
fn concurrent_allocations_never_overlap() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let threads = 8;
    let per_thread = 10;
    let total = (threads * per_thread) as u64;

    let vmem = Arc::new(LockedVmem::new());
    let arena = vmem.create("shared", Span::new(0, total), 1);
    let start = Arc::new(Barrier::new(threads));

    let mut handles = Vec::with_capacity(threads);
    for _ in 0..threads {
        let vmem = Arc::clone(&vmem);
        let start = Arc::clone(&start);
        handles.push(thread::spawn(move || {
            start.wait();
            let mut bases = Vec::with_capacity(per_thread);
            for _ in 0..per_thread {
                bases.push(vmem.alloc(arena, 1, AllocPolicy::NextFit).unwrap());
            }
            bases
        }));
    }

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), threads * per_thread, "duplicate bases handed out");
    assert_eq!(vmem.stats(arena).used, total);
    assert_eq!(vmem.stats(arena).free, 0);
}

#[test]
fn concurrent_free_and_alloc_conserve_the_resource() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let workers = 4;
    let rounds = 50;

    let vmem = Arc::new(LockedVmem::new());
    let total: u64 = 16 * workers as u64;
    let arena = vmem.create("churn", Span::new(0, total), 1);
    let start = Arc::new(Barrier::new(workers));

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let vmem = Arc::clone(&vmem);
        let start = Arc::clone(&start);
        handles.push(thread::spawn(move || {
            start.wait();
            for _ in 0..rounds {
                if let Some(base) = vmem.alloc(arena, 16, AllocPolicy::NextFit) {
                    vmem.free(arena, base).unwrap();
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let stats = vmem.stats(arena);
    assert_eq!(stats.used, 0);
    assert_eq!(stats.free, total);
    assert_eq!(stats.free_segments, 1, "churn must coalesce back to one tag");
}
