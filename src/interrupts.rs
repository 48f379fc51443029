/*
 * Interrupt Management Module
 *
 * Every scheduler-visible mutable structure (ready queues, thread table,
 * sleeping list, lock wait lists) is protected exclusively by disabling
 * interrupts for the duration of the access — there is only one CPU, so a
 * spinlock buys nothing a disabled-interrupts section doesn't already give.
 *
 * The production half wraps the x86_64 crate's interrupt instructions. A
 * hosted test build cannot execute `cli`/`sti`, so `#[cfg(test)]` swaps in
 * an AtomicBool-backed mock with the identical signatures.
 */

#[cfg(not(test))]
mod imp {
    use x86_64::instructions::interrupts;

    pub fn enable() {
        interrupts::enable();
    }

    pub fn disable() {
        interrupts::disable();
    }

    pub fn are_enabled() -> bool {
        interrupts::are_enabled()
    }
}

#[cfg(test)]
mod imp {
    use core::sync::atomic::{AtomicBool, Ordering};

    static ENABLED: AtomicBool = AtomicBool::new(true);

    pub fn enable() {
        ENABLED.store(true, Ordering::SeqCst);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::SeqCst);
    }

    pub fn are_enabled() -> bool {
        ENABLED.load(Ordering::SeqCst)
    }
}

pub use imp::{are_enabled, disable, enable};

/// Execute a closure with interrupts disabled, restoring the prior state
/// (not unconditionally re-enabling) once it returns.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = DisableInterrupts::new();
    f()
}

/// RAII guard that disables interrupts for its lifetime and restores the
/// prior state on drop, even if the guarded code panics.
pub struct DisableInterrupts {
    were_enabled: bool,
}

impl DisableInterrupts {
    pub fn new() -> Self {
        let were_enabled = are_enabled();
        if were_enabled {
            disable();
        }
        Self { were_enabled }
    }
}

impl Default for DisableInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisableInterrupts {
    fn drop(&mut self) {
        if self.were_enabled {
            enable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases share one test function: the mock's backing flag is a
    // single process-wide AtomicBool, so interleaving this with another
    // #[test] touching it would race.
    #[test]
    fn guard_disables_and_restores_prior_state() {
        disable();
        {
            let _g = DisableInterrupts::new();
            assert!(!are_enabled());
        }
        assert!(!are_enabled(), "should restore the prior disabled state");

        enable();
        {
            let _g = DisableInterrupts::new();
            assert!(!are_enabled());
        }
        assert!(are_enabled(), "should restore the prior enabled state");
    }
}
