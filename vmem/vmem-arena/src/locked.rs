//! Lock-wrapped allocator front end.

use crate::arena::ArenaRef;
use crate::vmem::{AllocPolicy, ArenaStats, FreeError, Vmem};
use vmem_span::Span;
use vmem_sync::SpinLock;

/// A [`Vmem`] behind one [`SpinLock`]. Every operation runs start to
/// finish under the lock, pool and registry mutations included, so the
/// whole context stays consistent across cores.
///
/// `new` is `const`:
///
/// ```rust
/// # use vmem_arena::{AllocPolicy, LockedVmem, Span};
/// static VMEM: LockedVmem = LockedVmem::new();
///
/// let heap = VMEM.create("heap", Span::new(0x1000, 0x4000), 0x1000);
/// let page = VMEM.alloc(heap, 1, AllocPolicy::NextFit);
/// assert_eq!(page, Some(0x1000));
/// ```
pub struct LockedVmem {
    inner: SpinLock<Vmem>,
}

impl LockedVmem {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SpinLock::new(Vmem::new()),
        }
    }

    /// [`Vmem::create`] under the lock.
    ///
    /// # Panics
    /// See [`Vmem::create`].
    #[must_use]
    pub fn create(&self, name: &str, span: Span, quantum: u64) -> ArenaRef {
        self.inner.with_lock(|vm| vm.create(name, span, quantum))
    }

    /// [`Vmem::add`] under the lock.
    ///
    /// # Panics
    /// See [`Vmem::add`].
    pub fn add(&self, arena: ArenaRef, span: Span) -> u64 {
        self.inner.with_lock(|vm| vm.add(arena, span))
    }

    /// [`Vmem::alloc`] under the lock.
    ///
    /// # Panics
    /// See [`Vmem::alloc`].
    #[must_use]
    pub fn alloc(&self, arena: ArenaRef, size: u64, policy: AllocPolicy) -> Option<u64> {
        self.inner.with_lock(|vm| vm.alloc(arena, size, policy))
    }

    /// [`Vmem::free`] under the lock.
    ///
    /// # Errors
    /// See [`Vmem::free`].
    pub fn free(&self, arena: ArenaRef, base: u64) -> Result<(), FreeError> {
        self.inner.with_lock(|vm| vm.free(arena, base))
    }

    /// [`Vmem::stats`] under the lock.
    #[must_use]
    pub fn stats(&self, arena: ArenaRef) -> ArenaStats {
        self.inner.with_lock(|vm| vm.stats(arena))
    }

    /// [`Vmem::dump`] under the lock.
    pub fn dump(&self, arena: ArenaRef) {
        self.inner.with_lock(|vm| vm.dump(arena));
    }

    /// [`Vmem::dump_all`] under the lock.
    pub fn dump_all(&self) {
        self.inner.with_lock(|vm| vm.dump_all());
    }

    /// Run several operations under one acquisition.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vmem) -> R) -> R {
        self.inner.with_lock(f)
    }
}

impl Default for LockedVmem {
    fn default() -> Self {
        Self::new()
    }
}
