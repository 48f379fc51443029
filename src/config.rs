/*
 * Scheduler configuration constants.
 *
 * Collected here the way the teacher collects THREAD_STACK_SIZE/MAX_THREADS
 * at the top of its scheduler module, rather than scattering magic numbers
 * through the implementation.
 */

/// Lowest priority a thread may hold.
pub const PRI_MIN: i32 = 0;

/// Priority assigned to a newly created thread before nice/donation apply.
pub const PRI_DEFAULT: i32 = 31;

/// Highest priority a thread may hold.
pub const PRI_MAX: i32 = 63;

/// Lowest legal `nice` value.
pub const NICE_MIN: i32 = -20;

/// Default `nice` value for a newly created thread.
pub const NICE_DEFAULT: i32 = 0;

/// Highest legal `nice` value.
pub const NICE_MAX: i32 = 20;

/// Ticks between MLFQS partial priority recomputation passes, and the
/// scheduler's preemption quantum.
pub const TIME_SLICE: u32 = 4;

/// Kernel thread stack size in bytes.
pub const THREAD_STACK_SIZE: usize = 64 * 1024;

/// Stack-overflow sentinel stamped into every `Thread` at construction and
/// checked by `Thread::is_thread`/`Kernel::thread`. Same constant value as
/// the distilled original's `THREAD_MAGIC`.
pub const THREAD_MAGIC: u32 = 0xcd6abf4b;

/// Timer interrupt frequency, in Hz. Must stay in `19..=1000` the way the
/// distilled original rejects out-of-range frequencies at compile time.
pub const TIMER_FREQ: u32 = 100;

const _: () = assert!(
    TIMER_FREQ >= 19 && TIMER_FREQ <= 1000,
    "TIMER_FREQ must be in 19..=1000"
);

/// Returns the number of ticks in one second at the configured frequency.
pub const fn ticks_per_second() -> u32 {
    TIMER_FREQ
}
