/*
 * Mesa-style condition variable layered over a lock and a
 * semaphore-per-waiter, grounded on original_source/src/threads/synch.c's
 * `cond_init`/`cond_wait`/`cond_signal`/`cond_broadcast` and the
 * `semaphore_elem` waiter wrapper (a private, single-use semaphore plus
 * the waiting thread's identity, so `cond_signal` can wake the
 * highest-priority waiter rather than a strict FIFO one).
 */

use alloc::vec::Vec;

use crate::kernel;
use crate::lock::Lock;
use crate::sema::SemaphoreId;
use crate::thread::ThreadId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CondVarId(pub usize);

pub struct CondVarCb {
    pub waiters: Vec<(ThreadId, SemaphoreId)>,
}

impl CondVarCb {
    pub fn new() -> Self {
        CondVarCb {
            waiters: Vec::new(),
        }
    }
}

impl Default for CondVarCb {
    fn default() -> Self {
        Self::new()
    }
}

/// User-facing condition variable handle.
pub struct CondVar {
    id: CondVarId,
}

impl CondVar {
    pub fn new() -> Self {
        CondVar {
            id: kernel::cond_init(),
        }
    }

    /// Atomically releases `lock` and blocks the calling thread until
    /// signalled, then reacquires `lock` before returning. `lock` must be
    /// held by the calling thread.
    pub fn wait(&self, lock: &Lock) {
        kernel::cond_wait(self.id, lock.id());
    }

    /// Wakes one waiting thread, if any. `lock` must be held by the
    /// calling thread.
    pub fn signal(&self, lock: &Lock) {
        kernel::cond_signal(self.id, lock.id());
    }

    /// Wakes every waiting thread. `lock` must be held by the calling
    /// thread.
    pub fn broadcast(&self, lock: &Lock) {
        kernel::cond_broadcast(self.id, lock.id());
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}
