/*
 * Non-recursive lock with chained priority donation.
 *
 * Data shapes grounded on original_source/src/threads/synch.c's `struct
 * lock` plus the cached-priority field the donation chain maintains
 * (`recalc_cached_lock_priority`). The donation walk itself
 * (`donate_lock_priority`/`donate_thread_priority`) lives on `Kernel` in
 * kernel.rs, since it must reach across both the lock and thread arenas.
 * A `LockId` indexes `Kernel`'s lock arena, the arena-by-id pattern used
 * by r3_kernel's `MutexCb` lookup for the same Thread/Lock cyclic
 * reference problem.
 */

use alloc::vec::Vec;

use crate::config::PRI_MIN;
use crate::kernel;
use crate::thread::ThreadId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId(pub usize);

pub struct LockCb {
    pub holder: Option<ThreadId>,
    pub waiters: Vec<ThreadId>,
    /// Highest priority among `waiters`, recomputed whenever the waiter
    /// set changes. `PRI_MIN` when no thread is waiting.
    pub cached_priority: i32,
}

impl LockCb {
    pub fn new() -> Self {
        LockCb {
            holder: None,
            waiters: Vec::new(),
            cached_priority: PRI_MIN,
        }
    }
}

impl Default for LockCb {
    fn default() -> Self {
        Self::new()
    }
}

/// User-facing lock handle. Thin wrapper over a `LockId`; all state lives
/// in the kernel singleton's lock arena.
pub struct Lock {
    id: LockId,
}

impl Lock {
    pub fn new() -> Self {
        Lock {
            id: kernel::lock_init(),
        }
    }

    pub fn id(&self) -> LockId {
        self.id
    }

    /// Blocks the calling thread until the lock is free, then acquires it.
    /// Donates the calling thread's effective priority up the holder chain
    /// while blocked.
    pub fn acquire(&self) {
        kernel::lock_acquire(self.id);
    }

    /// Acquires the lock only if it is currently free, without blocking.
    pub fn try_acquire(&self) -> bool {
        kernel::lock_try_acquire(self.id)
    }

    /// Releases the lock. Must be called by the current holder.
    pub fn release(&self) {
        kernel::lock_release(self.id);
    }

    pub fn is_held_by_current(&self) -> bool {
        kernel::lock_held_by_current(self.id)
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}
