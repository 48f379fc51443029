/*
 * Scheduler error types.
 *
 * Resource-exhaustion failures use Result with this enum; precondition
 * violations and integrity failures remain asserts, matching the teacher's
 * own split between fallible and assert-checked paths.
 */

use core::fmt;

/// Failure to create a new thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadCreateError {
    /// The thread table has no free slot left.
    OutOfThreads,
    /// The requested stack could not be allocated.
    StackAllocationFailed,
}

impl fmt::Display for ThreadCreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadCreateError::OutOfThreads => write!(f, "thread table is full"),
            ThreadCreateError::StackAllocationFailed => {
                write!(f, "failed to allocate thread stack")
            }
        }
    }
}
