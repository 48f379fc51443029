/*
 * Chained priority donation, active only under the donation policy — the
 * MLFQS policy never donates (a donation-free rule carried directly from
 * original_source/src/threads/synch.c, which checks `thread_mlfqs` before
 * ever comparing `cached_priority`).
 *
 * `donate_lock_priority`/`donate_thread_priority` are the mutually
 * recursive walk from original_source/src/threads/synch.c: raising a
 * lock's cached priority propagates to its holder, and raising a thread's
 * cached priority propagates to the lock it is itself waiting on, all the
 * way up the chain. `recalc_cached_priority` is
 * `recalc_cached_lock_priority`/`get_lock_priority` collapsed onto a
 * thread: its own base priority, or the highest priority donated through
 * any lock it still holds, whichever is larger.
 */

use crate::kernel::Kernel;
use crate::lock::LockId;
use crate::thread::ThreadId;

pub(crate) fn donate_lock_priority(kernel: &mut Kernel, lock: LockId, new_priority: i32) {
    if new_priority <= kernel.locks[lock.0].cached_priority {
        return;
    }
    kernel.locks[lock.0].cached_priority = new_priority;
    if let Some(holder) = kernel.locks[lock.0].holder {
        log::trace!(
            "donation: lock {:?} raised to {} via holder {:?}",
            lock,
            new_priority,
            holder
        );
        donate_thread_priority(kernel, holder, new_priority);
    }
}

pub(crate) fn donate_thread_priority(kernel: &mut Kernel, thread: ThreadId, new_priority: i32) {
    if new_priority <= kernel.threads[thread.0].cached_priority {
        return;
    }
    kernel.threads[thread.0].cached_priority = new_priority;
    log::debug!("donation: thread {:?} raised to {}", thread, new_priority);
    if let Some(lock) = kernel.threads[thread.0].waiting_on_lock {
        donate_lock_priority(kernel, lock, new_priority);
    }
}

/// Recomputes `thread`'s cached (effective) priority from its own base
/// priority and whatever any lock it still holds has donated to it.
/// Called after releasing a lock or after `set_priority` lowers the base.
pub(crate) fn recalc_cached_priority(kernel: &mut Kernel, thread: ThreadId) {
    let base = kernel.threads[thread.0].priority;
    let donated = kernel.threads[thread.0]
        .held_locks
        .iter()
        .map(|&l| kernel.locks[l.0].cached_priority)
        .max()
        .unwrap_or(crate::config::PRI_MIN);
    kernel.threads[thread.0].cached_priority = base.max(donated);
}
