/*
 * Thread control block.
 *
 * Field shape grounded on the teacher's scheduler::thread::Thread (id,
 * name, state, stack, cpu-time bookkeeping) generalized with the fields
 * the donation and MLFQS policies both need: base priority, donation
 * cache, held-lock set, the lock a blocked thread is waiting on, and the
 * nice/recent_cpu pair for MLFQS.
 */

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::config;
use crate::fixed_point::Fixed;
use crate::lock::LockId;

/// Opaque thread handle. Indexes into `Kernel`'s thread arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

/// Lifecycle state of a thread, matching the terms used throughout the
/// scheduling literature this crate implements (RUNNING/READY/BLOCKED/DYING).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Ready,
    Blocked,
    Dying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub id: ThreadId,
    pub state: ThreadState,
    pub priority: i32,
    pub effective_priority: i32,
}

/// A single thread's control block.
pub struct Thread {
    pub id: ThreadId,
    pub name: String,
    pub state: ThreadState,
    pub stack: Box<[u8]>,

    /// Base priority: either set at creation (donation mode) or maintained
    /// by the MLFQS recurrence (MLFQS mode).
    pub priority: i32,

    /// Cached effective priority: own priority, or the highest priority
    /// donated through a lock this thread holds, whichever is larger.
    /// Recomputed eagerly at every donation/release point so reads never
    /// need to walk the lock graph.
    pub cached_priority: i32,

    /// Locks currently held by this thread, most-recently-acquired last.
    pub held_locks: Vec<LockId>,

    /// The lock this thread is blocked trying to acquire, if any. The head
    /// of the donation chain starts here.
    pub waiting_on_lock: Option<LockId>,

    /// MLFQS-only: niceness, operator-controlled, unaffected by priority
    /// donation.
    pub nice: i32,

    /// MLFQS-only: recent CPU usage estimate in 17.14 fixed point.
    pub recent_cpu: Fixed,

    /// Absolute tick at which a sleeping thread should wake; unused unless
    /// the thread is blocked on the alarm clock.
    pub wake_tick: Option<u64>,

    pub cpu_ticks: u64,

    /// Stack-overflow sentinel, stamped to `config::THREAD_MAGIC` at
    /// construction and never touched again. The original detects a
    /// corrupted control block because `struct thread` sits at the base of
    /// its own stack page, so an overflowing stack clobbers `magic` first;
    /// here `Thread` and its `stack` are separate allocations, so this can
    /// no longer catch a genuine stack overflow, but it still catches the
    /// same class of bug the original's `is_thread` guards against: a
    /// `Thread` read back through a stale or wrongly-typed handle. Checked
    /// by `is_thread`/`Kernel::thread`.
    magic: u32,
}

impl Thread {
    pub fn new(id: ThreadId, name: String, stack: Box<[u8]>, priority: i32) -> Self {
        Thread {
            id,
            name,
            state: ThreadState::Ready,
            stack,
            priority,
            cached_priority: priority,
            held_locks: Vec::new(),
            waiting_on_lock: None,
            nice: config::NICE_DEFAULT,
            recent_cpu: Fixed::ZERO,
            wake_tick: None,
            cpu_ticks: 0,
            magic: config::THREAD_MAGIC,
        }
    }

    /// Mirrors the original's `is_thread`: `true` iff the sentinel stamped
    /// at construction is still intact.
    pub fn is_thread(&self) -> bool {
        self.magic == config::THREAD_MAGIC
    }

    pub fn snapshot(&self) -> ThreadSnapshot {
        ThreadSnapshot {
            id: self.id,
            state: self.state,
            priority: self.priority,
            effective_priority: self.cached_priority,
        }
    }
}

impl core::fmt::Debug for Thread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("cached_priority", &self.cached_priority)
            .field("nice", &self.nice)
            .finish()
    }
}
