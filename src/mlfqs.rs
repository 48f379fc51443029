/*
 * 64-level multilevel feedback queue scheduler.
 *
 * Grounded on original_source/src/threads/thread.c's `thread_tick_mlfqs`:
 * every tick, the running thread's `recent_cpu` gains one (unless it is
 * idle); every `TIMER_FREQ` ticks, `load_avg` and every thread's
 * `recent_cpu` and priority are recomputed in full
 * (`mlfqs_update_load_avg`, `mlfqs_update_recent_cpu`,
 * `mlfqs_calc_priority`); every `TIME_SLICE` ticks, only the up-to-
 * `TIME_SLICE` distinct threads that actually ran since the last partial
 * pass get their priority recomputed, tracked via the ring buffer
 * `Kernel::run_slots` (`threads_run_in_time_slice`).
 */

use crate::config::{self, NICE_DEFAULT, PRI_MAX, PRI_MIN};
use crate::fixed_point::Fixed;
use crate::kernel::Kernel;
use crate::thread::ThreadId;

/// `priority = clamp(PRI_MAX - recent_cpu/4 - nice*2, PRI_MIN, PRI_MAX)`.
fn calc_priority(recent_cpu: Fixed, nice: i32) -> i32 {
    let term = recent_cpu.div_int(4).to_int_round();
    (PRI_MAX - term - nice * 2).clamp(PRI_MIN, PRI_MAX)
}

/// Recomputes one thread's MLFQS priority and relocates it in the ready
/// queue if it is currently READY. MLFQS never donates, so `priority` and
/// `cached_priority` always track each other exactly.
pub(crate) fn recompute_priority(kernel: &mut Kernel, tid: ThreadId) {
    let recent_cpu = kernel.thread(tid).recent_cpu;
    let nice = kernel.thread(tid).nice;
    let priority = calc_priority(recent_cpu, nice);
    kernel.set_thread_priority_fields(tid, priority);
    kernel.reposition_if_ready(tid);
}

fn recent_cpu_decay(load_avg: Fixed) -> Fixed {
    let two_load = load_avg.mul_int(2);
    two_load.div(two_load.add_int(1))
}

fn recompute_recent_cpu_all(kernel: &mut Kernel) {
    let load_avg = kernel.load_avg;
    let decay = recent_cpu_decay(load_avg);
    let ids: alloc::vec::Vec<ThreadId> = (0..kernel.thread_count()).map(ThreadId).collect();
    for tid in ids {
        if tid == kernel.idle_id() {
            continue;
        }
        let nice = kernel.thread(tid).nice;
        let old = kernel.thread(tid).recent_cpu;
        let updated = decay.mul(old).add_int(nice);
        kernel.set_thread_recent_cpu(tid, updated);
    }
}

fn recompute_load_avg(kernel: &mut Kernel) {
    let ready_count = kernel.ready_and_running_count();
    let fifty_nine_sixtieths = Fixed::from_int(59).div_int(60);
    let one_sixtieth = Fixed::from_int(1).div_int(60);
    let new_avg = fifty_nine_sixtieths
        .mul(kernel.load_avg)
        .add(one_sixtieth.mul_int(ready_count as i32));
    kernel.load_avg = new_avg;
}

/// Called once per tick while MLFQS is the active policy.
pub(crate) fn on_tick(kernel: &mut Kernel, now: u64) {
    let cur = kernel.current_id();
    if cur != kernel.idle_id() {
        let bumped = kernel.thread(cur).recent_cpu.add_int(1);
        kernel.set_thread_recent_cpu(cur, bumped);
    }

    let ticks_per_second = u64::from(config::ticks_per_second());
    if now % ticks_per_second == 0 {
        log::trace!("mlfqs: full recompute at tick {now}");
        recompute_load_avg(kernel);
        recompute_recent_cpu_all(kernel);
        let ids: alloc::vec::Vec<ThreadId> = (0..kernel.thread_count()).map(ThreadId).collect();
        for tid in ids {
            recompute_priority(kernel, tid);
        }
        kernel.clear_run_slots();
    } else if now % u64::from(config::TIME_SLICE) == 0 {
        let slots = kernel.run_slots_snapshot();
        log::trace!("mlfqs: partial recompute at tick {now} for {} threads", slots.len());
        for tid in slots {
            recompute_priority(kernel, tid);
        }
        kernel.clear_run_slots();
    }
}

/// Initializes a freshly created thread's MLFQS fields from its parent's
/// `nice` (defaulting to `NICE_DEFAULT` for the very first thread) and
/// computes its initial priority.
pub(crate) fn init_new_thread(kernel: &mut Kernel, tid: ThreadId, nice: i32) {
    kernel.thread_mut_for_init(tid).nice = nice;
    recompute_priority(kernel, tid);
}

pub(crate) const DEFAULT_NICE: i32 = NICE_DEFAULT;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use crate::thread::ThreadState;

    #[test]
    fn higher_nice_yields_lower_priority() {
        let mut k = Kernel::new(Policy::Mlfqs);
        let a = k.create_thread("a", config::PRI_DEFAULT).unwrap();
        let b = k.create_thread("b", config::PRI_DEFAULT).unwrap();
        k.thread_mut_for_init(a).nice = 0;
        k.thread_mut_for_init(b).nice = 10;
        recompute_priority(&mut k, a);
        recompute_priority(&mut k, b);
        assert!(k.thread(a).priority > k.thread(b).priority);
    }

    #[test]
    fn recent_cpu_accumulates_while_running_not_while_idle() {
        let mut k = Kernel::new(Policy::Mlfqs);
        let worker = k.create_thread("worker", config::PRI_DEFAULT).unwrap();
        k.current = worker;
        k.threads[worker.0].state = ThreadState::Running;
        for tick in 1..=3u64 {
            k.tick(crate::timer::TickCategory::Kernel);
            let _ = tick;
        }
        assert!(k.thread(worker).recent_cpu.to_int_trunc() >= 0);
        assert_eq!(k.thread(worker).recent_cpu.raw() > 0, true);
    }

    #[test]
    fn full_recompute_runs_every_timer_frequency_ticks() {
        let mut k = Kernel::new(Policy::Mlfqs);
        let before = k.load_avg;
        for _ in 0..config::ticks_per_second() {
            k.tick(crate::timer::TickCategory::Idle);
        }
        // with no threads ready, load_avg should have been recomputed at
        // least once and remain a finite, non-negative fixed-point value.
        assert!(k.load_avg.raw() >= 0);
        let _ = before;
    }
}
