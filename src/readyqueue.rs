/*
 * Ready queue storage shared by both scheduling policies.
 *
 * Grounded on original_source/src/threads/ready_list.c: 64 priority buckets
 * plus a cached highest-occupied-bucket index and a cached thread count, so
 * `highest_priority`/`len` are O(1) instead of a rescan. `pop` takes from
 * the highest bucket and only rescans downward when that bucket empties,
 * exactly mirroring `poll_ready_list`.
 */

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::config::{PRI_MAX, PRI_MIN};
use crate::thread::ThreadId;

const BUCKETS: usize = (PRI_MAX - PRI_MIN + 1) as usize;

pub struct BucketedReadyQueue {
    buckets: Vec<VecDeque<ThreadId>>,
    cached_highest: Option<usize>,
    count: usize,
}

impl BucketedReadyQueue {
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(BUCKETS);
        for _ in 0..BUCKETS {
            buckets.push(VecDeque::new());
        }
        BucketedReadyQueue {
            buckets,
            cached_highest: None,
            count: 0,
        }
    }

    fn bucket_index(priority: i32) -> usize {
        priority.clamp(PRI_MIN, PRI_MAX) as usize
    }

    /// Pushes a thread into the bucket for `priority`, updating the cached
    /// highest occupied bucket.
    pub fn push(&mut self, tid: ThreadId, priority: i32) {
        let idx = Self::bucket_index(priority);
        self.buckets[idx].push_back(tid);
        self.count += 1;
        self.cached_highest = Some(match self.cached_highest {
            Some(h) if h >= idx => h,
            _ => idx,
        });
    }

    /// Removes and returns the highest-priority ready thread, FIFO within
    /// its bucket.
    pub fn pop(&mut self) -> Option<ThreadId> {
        let highest = self.cached_highest?;
        let tid = self.buckets[highest].pop_front()?;
        self.count -= 1;
        if self.buckets[highest].is_empty() {
            self.cached_highest = (0..=highest).rev().find(|&i| !self.buckets[i].is_empty());
        }
        Some(tid)
    }

    /// Removes a specific thread from wherever it is currently queued
    /// (used when a thread's priority changes while it is still READY).
    pub fn remove(&mut self, tid: ThreadId) -> Option<i32> {
        for (idx, bucket) in self.buckets.iter_mut().enumerate() {
            if let Some(pos) = bucket.iter().position(|&t| t == tid) {
                bucket.remove(pos);
                self.count -= 1;
                if self.buckets[idx].is_empty() && self.cached_highest == Some(idx) {
                    self.cached_highest =
                        (0..idx).rev().find(|&i| !self.buckets[i].is_empty());
                }
                return Some(idx as i32);
            }
        }
        None
    }

    pub fn highest_priority(&self) -> Option<i32> {
        self.cached_highest.map(|h| h as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.buckets.iter().flat_map(|b| b.iter().copied())
    }
}

impl Default for BucketedReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_highest_priority_first() {
        let mut q = BucketedReadyQueue::new();
        q.push(ThreadId(1), 10);
        q.push(ThreadId(2), 30);
        q.push(ThreadId(3), 20);
        assert_eq!(q.pop(), Some(ThreadId(2)));
        assert_eq!(q.pop(), Some(ThreadId(3)));
        assert_eq!(q.pop(), Some(ThreadId(1)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn fifo_within_same_bucket() {
        let mut q = BucketedReadyQueue::new();
        q.push(ThreadId(1), 5);
        q.push(ThreadId(2), 5);
        assert_eq!(q.pop(), Some(ThreadId(1)));
        assert_eq!(q.pop(), Some(ThreadId(2)));
    }

    #[test]
    fn remove_relocates_cached_highest() {
        let mut q = BucketedReadyQueue::new();
        q.push(ThreadId(1), 10);
        q.push(ThreadId(2), 30);
        assert_eq!(q.highest_priority(), Some(30));
        q.remove(ThreadId(2));
        assert_eq!(q.highest_priority(), Some(10));
        assert_eq!(q.len(), 1);
    }
}
