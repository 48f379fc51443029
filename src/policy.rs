/*
 * Scheduling policy selection.
 *
 * The policy is chosen once at boot, mirroring a kernel command-line flag,
 * not a Cargo feature: both policies are always compiled in, and `Kernel`
 * dispatches every priority-affecting operation to the `donation` or
 * `mlfqs` module depending on which was selected at `Kernel::new`.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Strict priority scheduling with chained priority donation through
    /// held locks.
    Donation,
    /// 64-level multilevel feedback queue scheduler.
    Mlfqs,
}
