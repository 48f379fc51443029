/*
 * Alarm clock: sorted sleeping list keyed by absolute wake tick.
 *
 * Grounded on original_source/src/devices/timer.c's sleeping-thread list
 * (`sleeping_thread_list_less_func`, `list_insert_ordered`). The original
 * wakes a sleeper by `sema_up`-ing a semaphore living on that thread's own
 * stack frame; safe Rust has no such stack slot to borrow, so each entry
 * instead records the `ThreadId` directly and the tick handler unblocks it
 * by id (SPEC_FULL.md decision D). FIFO tie-break for equal wake ticks,
 * matching `list_insert_ordered`'s stable insert.
 */

use alloc::vec::Vec;

use crate::list;
use crate::thread::ThreadId;

pub struct AlarmEntry {
    pub wake_tick: u64,
    pub thread: ThreadId,
}

/// Threads blocked in `timer_sleep`, ordered by ascending wake tick.
pub struct SleepingList {
    entries: Vec<AlarmEntry>,
}

impl SleepingList {
    pub fn new() -> Self {
        SleepingList {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, wake_tick: u64, thread: ThreadId) {
        list::insert_ordered(&mut self.entries, AlarmEntry { wake_tick, thread }, |e| {
            e.wake_tick
        });
    }

    /// Removes and returns every entry whose wake tick has arrived,
    /// earliest first.
    pub fn drain_expired(&mut self, now: u64) -> Vec<ThreadId> {
        let split = self
            .entries
            .iter()
            .position(|e| e.wake_tick > now)
            .unwrap_or(self.entries.len());
        self.entries
            .drain(..split)
            .map(|e| e.thread)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for SleepingList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_only_expired_entries_in_order() {
        let mut list = SleepingList::new();
        list.insert(10, ThreadId(1));
        list.insert(5, ThreadId(2));
        list.insert(10, ThreadId(3));

        let woken = list.drain_expired(7);
        assert_eq!(woken, alloc::vec![ThreadId(2)]);
        assert_eq!(list.len(), 2);

        let woken = list.drain_expired(10);
        assert_eq!(woken, alloc::vec![ThreadId(1), ThreadId(3)]);
        assert!(list.is_empty());
    }
}
