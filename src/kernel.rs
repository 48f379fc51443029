/*
 * Scheduling mechanism core.
 *
 * `Kernel` is the single god-object holding every scheduler-visible
 * structure — the thread table, the lock/semaphore/condvar arenas, the
 * ready queue and the sleeping list. The free functions at the bottom of
 * this module expose it as a global singleton behind
 * `static KERNEL: Mutex<Option<Kernel>>`, the same shape as the teacher's
 * `static SCHEDULER: Mutex<Option<Scheduler>>`; each one disables
 * interrupts for its whole body (`interrupts::without_interrupts`), since
 * a single CPU needs nothing more elaborate to keep this state consistent.
 * The actual scheduling logic lives in inherent `Kernel` methods so it can
 * be exercised directly, against a locally constructed `Kernel`, in tests
 * without touching the process-wide singleton.
 *
 * Blocking methods (`lock_acquire`, `sema_down`, `cond_wait`) perform
 * their bookkeeping and hand off to `reschedule`, which updates `current`
 * to whichever thread the policy picks next, then return. In a hosted
 * kernel the caller would not actually resume this call site until a real
 * CPU context switch brings this thread back to RUNNING — that assembly-
 * level switch is the embedder's responsibility, not this crate's (the
 * same division the teacher's `SchedulerCore::reschedule` documents).
 * Tests therefore assert on state transitions (thread state, lock
 * ownership, wakeup order) rather than on a blocking call "returning late".
 */

use alloc::string::String;
use alloc::vec::Vec;

use spin::Mutex;

use crate::alarm::SleepingList;
use crate::condvar::{CondVarCb, CondVarId};
use crate::config::{self, PRI_DEFAULT, PRI_MAX, PRI_MIN};
use crate::donation;
use crate::error::ThreadCreateError;
use crate::fixed_point::Fixed;
use crate::interrupts;
use crate::lock::{LockCb, LockId};
use crate::mlfqs;
use crate::policy::Policy;
use crate::readyqueue::BucketedReadyQueue;
use crate::sema::{SemaphoreCb, SemaphoreId};
use crate::thread::{Thread, ThreadId, ThreadSnapshot, ThreadState};
use crate::timer::{TickCategory, TimerStats};

static KERNEL: Mutex<Option<Kernel>> = Mutex::new(None);

pub struct Kernel {
    pub(crate) policy: Policy,
    pub(crate) threads: Vec<Thread>,
    pub(crate) locks: Vec<LockCb>,
    pub(crate) semaphores: Vec<SemaphoreCb>,
    pub(crate) condvars: Vec<CondVarCb>,
    pub(crate) ready: BucketedReadyQueue,
    pub(crate) sleeping: SleepingList,
    pub(crate) current: ThreadId,
    pub(crate) idle: ThreadId,
    pub(crate) timer: TimerStats,
    pub(crate) load_avg: Fixed,
    /// Ring buffer of up to `TIME_SLICE` distinct threads run since the
    /// last partial MLFQS recompute; mirrors `threads_run_in_time_slice`.
    pub(crate) run_slots: heapless::Vec<ThreadId, 4>,
    /// Ticks the current thread has held the CPU since its last schedule,
    /// mirroring `thread_ticks` — reset in `reschedule`, compared against
    /// `config::TIME_SLICE` in `tick` to enforce round-robin preemption
    /// independent of priority.
    pub(crate) slice_ticks: u32,
}

impl Kernel {
    pub(crate) fn new(policy: Policy) -> Self {
        let idle_stack = alloc::vec![0u8; config::THREAD_STACK_SIZE].into_boxed_slice();
        let mut idle = Thread::new(ThreadId(0), String::from("idle"), idle_stack, PRI_MIN);
        // idle starts out RUNNING, never READY: it must never be found in
        // the ready queue (see SPEC_FULL.md open question 3).
        idle.state = ThreadState::Running;
        log::info!("kernel: idle thread created");
        Kernel {
            policy,
            threads: alloc::vec![idle],
            locks: Vec::new(),
            semaphores: Vec::new(),
            condvars: Vec::new(),
            ready: BucketedReadyQueue::new(),
            sleeping: SleepingList::new(),
            current: ThreadId(0),
            idle: ThreadId(0),
            timer: TimerStats::new(),
            load_avg: Fixed::ZERO,
            run_slots: heapless::Vec::new(),
            slice_ticks: 0,
        }
    }

    pub(crate) fn thread(&self, id: ThreadId) -> &Thread {
        let t = &self.threads[id.0];
        debug_assert!(t.is_thread(), "thread {:?} control block corrupted", id);
        t
    }

    pub fn thread_snapshot(&self, id: ThreadId) -> ThreadSnapshot {
        self.thread(id).snapshot()
    }

    pub fn current_id(&self) -> ThreadId {
        self.current
    }

    pub fn idle_id(&self) -> ThreadId {
        self.idle
    }

    pub fn timer_ticks(&self) -> u64 {
        self.timer.ticks()
    }

    /// Scheduling key used for ready-queue placement and wakeup ordering:
    /// donation-adjusted priority under the donation policy, plain
    /// MLFQS-computed priority otherwise.
    pub(crate) fn effective_priority(&self, id: ThreadId) -> i32 {
        self.threads[id.0].cached_priority
    }

    pub(crate) fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Sets both `priority` and `cached_priority` together, the MLFQS
    /// invariant that the two never diverge (no donation under this
    /// policy).
    pub(crate) fn set_thread_priority_fields(&mut self, id: ThreadId, priority: i32) {
        self.threads[id.0].priority = priority;
        self.threads[id.0].cached_priority = priority;
    }

    pub(crate) fn set_thread_recent_cpu(&mut self, id: ThreadId, value: Fixed) {
        self.threads[id.0].recent_cpu = value;
    }

    pub(crate) fn thread_mut_for_init(&mut self, id: ThreadId) -> &mut Thread {
        &mut self.threads[id.0]
    }

    /// `ready_count` from the MLFQS load-average recurrence: every READY
    /// thread, plus the currently RUNNING thread unless that is idle.
    pub(crate) fn ready_and_running_count(&self) -> usize {
        let running_counts = usize::from(self.current != self.idle);
        self.ready.len() + running_counts
    }

    pub(crate) fn clear_run_slots(&mut self) {
        self.run_slots.clear();
    }

    pub(crate) fn run_slots_snapshot(&self) -> alloc::vec::Vec<ThreadId> {
        self.run_slots.iter().copied().collect()
    }

    fn push_ready(&mut self, id: ThreadId) {
        let priority = self.effective_priority(id);
        self.threads[id.0].state = ThreadState::Ready;
        self.ready.push(id, priority);
    }

    /// Picks the next thread to run, falling back to idle, and installs it
    /// as `current`. Returns the newly current thread.
    fn reschedule(&mut self) -> ThreadId {
        let next = self.ready.pop().unwrap_or(self.idle);
        debug_assert!(
            self.threads[next.0].is_thread(),
            "scheduled thread {:?} control block corrupted",
            next
        );
        self.threads[next.0].state = ThreadState::Running;
        self.current = next;
        // start a fresh time slice for whichever thread now runs, mirroring
        // `thread_schedule_tail`'s unconditional `thread_ticks = 0`.
        self.slice_ticks = 0;
        if self.policy == Policy::Mlfqs && next != self.idle && !self.run_slots.contains(&next) {
            if self.run_slots.is_full() {
                self.run_slots.remove(0);
            }
            let _ = self.run_slots.push(next);
        }
        next
    }

    /// Relocates `tid` to the ready bucket matching its current effective
    /// priority, if it is presently READY. Used after an MLFQS priority
    /// recompute changes a ready thread's bucket.
    pub(crate) fn reposition_if_ready(&mut self, tid: ThreadId) {
        if self.threads[tid.0].state == ThreadState::Ready {
            self.ready.remove(tid);
            let priority = self.effective_priority(tid);
            self.ready.push(tid, priority);
        }
    }

    fn block_current(&mut self) -> ThreadId {
        let cur = self.current;
        self.threads[cur.0].state = ThreadState::Blocked;
        self.reschedule()
    }

    /// Preempts the caller's `cur` in favor of `candidate` if `candidate`
    /// now outranks it, mirroring the immediate-yield check Pintos runs
    /// after waking a higher-priority thread.
    fn maybe_preempt(&mut self, cur: ThreadId, candidate: ThreadId) {
        if cur != self.idle && self.effective_priority(candidate) > self.effective_priority(cur) {
            self.push_ready(cur);
            self.reschedule();
        }
    }

    /// Iterates every live thread, mirroring `thread_foreach`.
    pub fn for_each<F: FnMut(&Thread)>(&self, mut f: F) {
        for t in &self.threads {
            f(t);
        }
    }

    pub(crate) fn for_each_mut<F: FnMut(&mut Thread)>(&mut self, mut f: F) {
        for t in &mut self.threads {
            f(t);
        }
    }

    // --- thread lifecycle -------------------------------------------------

    /// Creates a thread at `priority` under the donation policy. Under
    /// MLFQS, `priority` is ignored (MLFQS derives it from `nice`) and the
    /// new thread instead inherits the creator's `nice`, matching the
    /// parent-inherits-nice rule a forked MLFQS thread follows.
    pub fn create_thread(&mut self, name: &str, priority: i32) -> Result<ThreadId, ThreadCreateError> {
        assert!((PRI_MIN..=PRI_MAX).contains(&priority));
        let stack = alloc::vec![0u8; config::THREAD_STACK_SIZE].into_boxed_slice();
        let id = ThreadId(self.threads.len());
        let thread = Thread::new(id, String::from(name), stack, priority);
        self.threads.push(thread);
        self.push_ready(id);
        log::debug!("thread {:?} {:?} created at priority {}", id, name, priority);
        if self.policy == Policy::Mlfqs {
            let inherited_nice = self.thread(self.current_id()).nice;
            mlfqs::init_new_thread(self, id, inherited_nice);
        }
        Ok(id)
    }

    pub fn yield_now(&mut self) -> ThreadId {
        let cur = self.current_id();
        if cur != self.idle {
            self.push_ready(cur);
        }
        self.reschedule()
    }

    pub fn block(&mut self) -> ThreadId {
        self.block_current()
    }

    pub fn unblock(&mut self, id: ThreadId) {
        debug_assert_eq!(self.thread(id).state, ThreadState::Blocked);
        self.push_ready(id);
    }

    pub fn exit_current(&mut self) -> ThreadId {
        let cur = self.current_id();
        self.threads[cur.0].state = ThreadState::Dying;
        self.reschedule()
    }

    pub fn get_priority(&self) -> i32 {
        self.thread(self.current_id()).priority
    }

    pub fn set_priority(&mut self, new_priority: i32) {
        assert!((PRI_MIN..=PRI_MAX).contains(&new_priority));
        assert_ne!(self.policy, Policy::Mlfqs, "priority is MLFQS-managed; use set_nice");
        let cur = self.current_id();
        self.threads[cur.0].priority = new_priority;
        donation::recalc_cached_priority(self, cur);
        if let Some(candidate) = self.ready.iter_ids().max_by_key(|&t| self.effective_priority(t)) {
            self.maybe_preempt(cur, candidate);
        }
    }

    pub fn get_nice(&self) -> i32 {
        self.thread(self.current_id()).nice
    }

    pub fn set_nice(&mut self, nice: i32) {
        assert!((config::NICE_MIN..=config::NICE_MAX).contains(&nice));
        let cur = self.current_id();
        self.threads[cur.0].nice = nice;
        mlfqs::recompute_priority(self, cur);
        if let Some(candidate) = self.ready.iter_ids().max_by_key(|&t| self.effective_priority(t)) {
            self.maybe_preempt(cur, candidate);
        }
    }

    /// Returns `100 * recent_cpu`, rounded to nearest, matching the classic
    /// reporting convention for the BSD scheduler's recent-CPU estimate.
    pub fn get_recent_cpu(&self) -> i32 {
        let cur = self.current_id();
        self.thread(cur).recent_cpu.mul_int(100).to_int_round()
    }

    /// Returns `100 * load_avg`, rounded to nearest.
    pub fn get_load_avg(&self) -> i32 {
        self.load_avg.mul_int(100).to_int_round()
    }

    // --- semaphores ---------------------------------------------------------

    pub fn sema_init(&mut self, value: u32) -> SemaphoreId {
        let id = SemaphoreId(self.semaphores.len());
        self.semaphores.push(SemaphoreCb::new(value));
        id
    }

    pub fn sema_down(&mut self, id: SemaphoreId) {
        if self.semaphores[id.0].value > 0 {
            self.semaphores[id.0].value -= 1;
            return;
        }
        let cur = self.current_id();
        self.semaphores[id.0].waiters.push(cur);
        self.block_current();
    }

    pub fn sema_try_down(&mut self, id: SemaphoreId) -> bool {
        if self.semaphores[id.0].value > 0 {
            self.semaphores[id.0].value -= 1;
            true
        } else {
            false
        }
    }

    pub fn sema_up(&mut self, id: SemaphoreId) {
        let threads = &self.threads;
        let woken = crate::list::pop_max_by_key(&mut self.semaphores[id.0].waiters, |&tid| {
            threads[tid.0].cached_priority
        });
        match woken {
            Some(tid) => {
                self.push_ready(tid);
                let cur = self.current_id();
                self.maybe_preempt(cur, tid);
            }
            None => {
                self.semaphores[id.0].value += 1;
            }
        }
    }

    // --- locks ---------------------------------------------------------------

    pub fn lock_init(&mut self) -> LockId {
        let id = LockId(self.locks.len());
        self.locks.push(LockCb::new());
        id
    }

    pub fn lock_held_by_current(&self, id: LockId) -> bool {
        self.locks[id.0].holder == Some(self.current_id())
    }

    pub fn lock_try_acquire(&mut self, id: LockId) -> bool {
        if self.locks[id.0].holder.is_none() {
            let cur = self.current_id();
            self.locks[id.0].holder = Some(cur);
            self.threads[cur.0].held_locks.push(id);
            true
        } else {
            false
        }
    }

    pub fn lock_acquire(&mut self, id: LockId) {
        if self.locks[id.0].holder.is_none() {
            let cur = self.current_id();
            self.locks[id.0].holder = Some(cur);
            self.threads[cur.0].held_locks.push(id);
            return;
        }
        let cur = self.current_id();
        self.threads[cur.0].waiting_on_lock = Some(id);
        self.locks[id.0].waiters.push(cur);
        if self.policy == Policy::Donation {
            let priority = self.effective_priority(cur);
            donation::donate_lock_priority(self, id, priority);
        }
        self.block_current();
    }

    pub fn lock_release(&mut self, id: LockId) {
        let cur = self.current_id();
        debug_assert_eq!(self.locks[id.0].holder, Some(cur));
        self.threads[cur.0].held_locks.retain(|&l| l != id);
        if self.policy == Policy::Donation {
            donation::recalc_cached_priority(self, cur);
        }

        let threads = &self.threads;
        let woken = crate::list::pop_max_by_key(&mut self.locks[id.0].waiters, |&tid| {
            threads[tid.0].cached_priority
        });
        match woken {
            Some(tid) => {
                self.locks[id.0].holder = Some(tid);
                self.threads[tid.0].waiting_on_lock = None;
                self.threads[tid.0].held_locks.push(id);
                self.locks[id.0].cached_priority = self.locks[id.0]
                    .waiters
                    .iter()
                    .map(|&t| self.effective_priority(t))
                    .max()
                    .unwrap_or(PRI_MIN);
                self.push_ready(tid);
                let cur = self.current_id();
                self.maybe_preempt(cur, tid);
            }
            None => {
                self.locks[id.0].holder = None;
                self.locks[id.0].cached_priority = PRI_MIN;
            }
        }
    }

    // --- condition variables -----------------------------------------------

    pub fn cond_init(&mut self) -> CondVarId {
        let id = CondVarId(self.condvars.len());
        self.condvars.push(CondVarCb::new());
        id
    }

    /// Registers the calling thread as a condvar waiter and returns the
    /// private semaphore it must block on after releasing the lock.
    pub fn cond_prepare_wait(&mut self, cond: CondVarId) -> SemaphoreId {
        let waiter_sema = self.sema_init(0);
        let cur = self.current_id();
        self.condvars[cond.0].waiters.push((cur, waiter_sema));
        waiter_sema
    }

    pub fn cond_signal(&mut self, cond: CondVarId) {
        let threads = &self.threads;
        let woken = crate::list::pop_max_by_key(&mut self.condvars[cond.0].waiters, |&(tid, _)| {
            threads[tid.0].cached_priority
        });
        if let Some((_, sema)) = woken {
            self.sema_up(sema);
        }
    }

    pub fn cond_broadcast(&mut self, cond: CondVarId) {
        while !self.condvars[cond.0].waiters.is_empty() {
            self.cond_signal(cond);
        }
    }

    // --- timer tick ----------------------------------------------------------

    /// Advances the tick counter by one, wakes expired sleepers, runs MLFQS
    /// bookkeeping if that policy is active, and returns whether the caller
    /// should invoke `yield_now` (equivalent to `intr_yield_on_return`): either
    /// the running thread's slice has expired or a higher-priority thread has
    /// become ready.
    pub fn tick(&mut self, category: TickCategory) -> bool {
        self.timer.on_tick(category);
        let now = self.timer.ticks();

        let woken = self.sleeping.drain_expired(now);
        for tid in woken {
            if self.thread(tid).state == ThreadState::Blocked {
                log::trace!("alarm: thread {:?} woken at tick {now}", tid);
                self.push_ready(tid);
            }
        }

        if self.policy == Policy::Mlfqs {
            mlfqs::on_tick(self, now);
        }

        let cur = self.current_id();
        // ticks spent in idle are not charged against cpu_ticks or the slice.
        let slice_expired = if cur != self.idle {
            self.threads[cur.0].cpu_ticks += 1;
            self.slice_ticks += 1;
            self.slice_ticks >= config::TIME_SLICE
        } else {
            false
        };

        slice_expired || self.ready.highest_priority().unwrap_or(PRI_MIN) > self.effective_priority(cur)
    }

    /// Blocks the calling thread until `wake_tick` (absolute tick count) has
    /// been reached. Returns immediately if `wake_tick` has already passed.
    pub fn sleep_until(&mut self, wake_tick: u64) {
        if self.timer.ticks() >= wake_tick {
            return;
        }
        let cur = self.current_id();
        self.sleeping.insert(wake_tick, cur);
        self.block_current();
    }
}

fn with_kernel<R>(f: impl FnOnce(&mut Kernel) -> R) -> R {
    interrupts::without_interrupts(|| {
        let mut guard = KERNEL.lock();
        let kernel = guard.as_mut().expect("kernel not initialized");
        f(kernel)
    })
}

/// Boots the scheduling core with the given policy, creating and
/// installing the idle thread as the initially running thread. Must be
/// called exactly once before any other function in this crate.
pub fn init(policy: Policy) {
    let mut guard = KERNEL.lock();
    assert!(guard.is_none(), "kernel already initialized");
    log::info!("kernel: scheduling core initialized under {:?} policy", policy);
    *guard = Some(Kernel::new(policy));
}

pub fn current_thread_id() -> ThreadId {
    with_kernel(|k| k.current_id())
}

pub fn thread_snapshot(id: ThreadId) -> ThreadSnapshot {
    with_kernel(|k| k.thread_snapshot(id))
}

pub fn for_each(mut f: impl FnMut(&Thread)) {
    with_kernel(|k| k.for_each(&mut f))
}

pub fn thread_create(name: &str, priority: i32) -> Result<ThreadId, ThreadCreateError> {
    with_kernel(|k| k.create_thread(name, priority))
}

pub fn thread_yield() -> ThreadId {
    with_kernel(|k| k.yield_now())
}

pub fn thread_block() -> ThreadId {
    with_kernel(|k| k.block())
}

pub fn thread_unblock(id: ThreadId) {
    with_kernel(|k| k.unblock(id))
}

pub fn thread_exit() -> ThreadId {
    with_kernel(|k| k.exit_current())
}

pub fn thread_get_priority() -> i32 {
    with_kernel(|k| k.get_priority())
}

pub fn thread_set_priority(new_priority: i32) {
    with_kernel(|k| k.set_priority(new_priority))
}

pub fn thread_get_nice() -> i32 {
    with_kernel(|k| k.get_nice())
}

pub fn thread_set_nice(nice: i32) {
    with_kernel(|k| k.set_nice(nice))
}

pub fn thread_get_recent_cpu() -> i32 {
    with_kernel(|k| k.get_recent_cpu())
}

pub fn thread_get_load_avg() -> i32 {
    with_kernel(|k| k.get_load_avg())
}

pub fn sema_init(value: u32) -> SemaphoreId {
    with_kernel(|k| k.sema_init(value))
}

pub fn sema_down(id: SemaphoreId) {
    with_kernel(|k| k.sema_down(id))
}

pub fn sema_try_down(id: SemaphoreId) -> bool {
    with_kernel(|k| k.sema_try_down(id))
}

pub fn sema_up(id: SemaphoreId) {
    with_kernel(|k| k.sema_up(id))
}

pub fn lock_init() -> LockId {
    with_kernel(|k| k.lock_init())
}

pub fn lock_held_by_current(id: LockId) -> bool {
    with_kernel(|k| k.lock_held_by_current(id))
}

pub fn lock_try_acquire(id: LockId) -> bool {
    with_kernel(|k| k.lock_try_acquire(id))
}

pub fn lock_acquire(id: LockId) {
    with_kernel(|k| k.lock_acquire(id))
}

pub fn lock_release(id: LockId) {
    with_kernel(|k| k.lock_release(id))
}

pub fn cond_init() -> CondVarId {
    with_kernel(|k| k.cond_init())
}

pub fn cond_wait(cond: CondVarId, lock: LockId) {
    let waiter_sema = with_kernel(|k| k.cond_prepare_wait(cond));
    lock_release(lock);
    sema_down(waiter_sema);
    lock_acquire(lock);
}

pub fn cond_signal(cond: CondVarId, _lock: LockId) {
    with_kernel(|k| k.cond_signal(cond))
}

pub fn cond_broadcast(cond: CondVarId, _lock: LockId) {
    with_kernel(|k| k.cond_broadcast(cond))
}

pub fn timer_tick(category: TickCategory) -> bool {
    with_kernel(|k| k.tick(category))
}

pub fn timer_sleep_until(wake_tick: u64) {
    with_kernel(|k| k.sleep_until(wake_tick))
}

pub fn timer_ticks() -> u64 {
    with_kernel(|k| k.timer_ticks())
}

pub(crate) fn default_priority() -> i32 {
    PRI_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_kernel_starts_on_idle() {
        let k = Kernel::new(Policy::Donation);
        assert_eq!(k.current_id(), k.idle_id());
    }

    #[test]
    fn create_thread_enqueues_ready() {
        let mut k = Kernel::new(Policy::Donation);
        let tid = k.create_thread("worker", 10).unwrap();
        assert_eq!(k.thread(tid).state, ThreadState::Ready);
    }

    #[test]
    fn yield_now_picks_highest_priority_ready_thread() {
        let mut k = Kernel::new(Policy::Donation);
        let low = k.create_thread("low", 5).unwrap();
        let high = k.create_thread("high", 20).unwrap();
        let next = k.yield_now();
        assert_eq!(next, high);
        assert_eq!(k.thread(low).state, ThreadState::Ready);
    }

    #[test]
    fn block_and_unblock_round_trip() {
        let mut k = Kernel::new(Policy::Donation);
        let worker = k.create_thread("worker", 10).unwrap();
        // worker is READY but not current; pretend it became current via
        // a direct yield, then block it.
        assert_eq!(k.yield_now(), worker);
        k.block();
        assert_eq!(k.thread(worker).state, ThreadState::Blocked);
        k.unblock(worker);
        assert_eq!(k.thread(worker).state, ThreadState::Ready);
    }

    #[test]
    fn sema_up_without_waiters_increments_value() {
        let mut k = Kernel::new(Policy::Donation);
        let sema = k.sema_init(0);
        assert!(!k.sema_try_down(sema));
        k.sema_up(sema);
        assert!(k.sema_try_down(sema));
    }

    #[test]
    fn sema_up_wakes_highest_priority_waiter_first() {
        let mut k = Kernel::new(Policy::Donation);
        let sema = k.sema_init(0);
        let low = k.create_thread("low", 5).unwrap();
        let high = k.create_thread("high", 20).unwrap();

        // move both onto the semaphore's waiter list directly, as if each
        // had called sema_down while current.
        k.threads[low.0].state = ThreadState::Blocked;
        k.semaphores[sema.0].waiters.push(low);
        k.threads[high.0].state = ThreadState::Blocked;
        k.semaphores[sema.0].waiters.push(high);

        k.sema_up(sema);
        assert_eq!(k.thread(high).state, ThreadState::Ready);
        assert_eq!(k.thread(low).state, ThreadState::Blocked);
    }

    #[test]
    fn lock_acquire_grants_immediately_when_free() {
        let mut k = Kernel::new(Policy::Donation);
        let lock = k.lock_init();
        k.lock_acquire(lock);
        assert!(k.lock_held_by_current(lock));
    }

    #[test]
    fn priority_donation_raises_holder_above_waiter() {
        let mut k = Kernel::new(Policy::Donation);
        let lock = k.lock_init();

        let holder = k.create_thread("holder", 10).unwrap();
        assert_eq!(k.yield_now(), holder);
        k.lock_acquire(lock);
        assert!(k.lock_held_by_current(lock));

        let waiter = k.create_thread("waiter", 30).unwrap();
        // switch "current" to the waiter by yielding the holder away, then
        // picking the waiter up via yield_now from an empty ready queue
        // step: simulate directly for clarity.
        k.current = waiter;
        k.threads[waiter.0].state = ThreadState::Running;
        k.lock_acquire(lock);

        assert_eq!(k.thread(holder).cached_priority, 30);
    }

    #[test]
    fn lock_release_transfers_to_highest_priority_waiter() {
        let mut k = Kernel::new(Policy::Donation);
        let lock = k.lock_init();

        let holder = k.create_thread("holder", 10).unwrap();
        k.current = holder;
        k.threads[holder.0].state = ThreadState::Running;
        k.lock_acquire(lock);

        let waiter = k.create_thread("waiter", 30).unwrap();
        k.current = waiter;
        k.threads[waiter.0].state = ThreadState::Running;
        k.lock_acquire(lock);
        assert_eq!(k.thread(waiter).state, ThreadState::Blocked);

        k.current = holder;
        k.threads[holder.0].state = ThreadState::Running;
        k.lock_release(lock);

        assert_eq!(k.locks[lock.0].holder, Some(waiter));
        assert_eq!(k.thread(waiter).state, ThreadState::Ready);
    }

    #[test]
    fn timer_tick_wakes_expired_sleeper() {
        let mut k = Kernel::new(Policy::Donation);
        let sleeper = k.create_thread("sleeper", 10).unwrap();
        k.threads[sleeper.0].state = ThreadState::Blocked;
        k.sleeping.insert(5, sleeper);

        for _ in 0..4 {
            k.tick(TickCategory::Kernel);
            assert_eq!(k.thread(sleeper).state, ThreadState::Blocked);
        }
        k.tick(TickCategory::Kernel);
        assert_eq!(k.thread(sleeper).state, ThreadState::Ready);
    }

    #[test]
    fn tick_signals_yield_once_the_slice_expires() {
        let mut k = Kernel::new(Policy::Donation);
        let worker = k.create_thread("worker", 10).unwrap();
        assert_eq!(k.yield_now(), worker);

        // no other ready thread outranks `worker`, so only slice expiry
        // should eventually request a yield.
        for _ in 0..config::TIME_SLICE - 1 {
            assert!(!k.tick(TickCategory::Kernel));
        }
        assert!(k.tick(TickCategory::Kernel));
    }

    #[test]
    fn equal_priority_threads_round_robin_on_slice_expiry() {
        let mut k = Kernel::new(Policy::Donation);
        let a = k.create_thread("a", 10).unwrap();
        let b = k.create_thread("b", 10).unwrap();
        assert_eq!(k.yield_now(), a);

        for _ in 0..config::TIME_SLICE {
            k.tick(TickCategory::Kernel);
        }
        // a's slice is up; once the ISR's yield-on-return actually runs
        // yield_now, b (the only other ready thread, same priority) takes
        // over and a goes back to the tail of its bucket.
        assert_eq!(k.yield_now(), b);
        assert_eq!(k.thread(a).state, ThreadState::Ready);

        for _ in 0..config::TIME_SLICE {
            k.tick(TickCategory::Kernel);
        }
        assert_eq!(k.yield_now(), a);
    }

    #[test]
    fn condvar_signal_wakes_a_waiter() {
        let mut k = Kernel::new(Policy::Donation);
        let lock = k.lock_init();
        let cond = k.cond_init();

        let holder = k.create_thread("holder", 10).unwrap();
        k.current = holder;
        k.threads[holder.0].state = ThreadState::Running;
        k.lock_acquire(lock);

        let waiter_sema = k.cond_prepare_wait(cond);
        k.lock_release(lock);
        k.threads[holder.0].state = ThreadState::Blocked;
        k.semaphores[waiter_sema.0].waiters.push(holder);

        k.cond_signal(cond);
        assert_eq!(k.thread(holder).state, ThreadState::Ready);
    }
}
