//! Cancellable countdown enforcing mandatory waiting periods.
//!
//! The timer only counts; it never sleeps. Whoever owns it decides when a second
//! has passed and calls [`CooldownTimer::tick`] with the handle it was given.
//! Every `start` bumps a generation, so a handle from an earlier cycle can never
//! advance or complete the current countdown.

use std::fmt;

/// Observable progress of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownState {
    pub remaining_seconds: u32,
    pub completed: bool,
}

/// Identifies one countdown instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    /// This tick reached zero; completion has already fired.
    Completed,
    /// The handle was cancelled, replaced, or already completed.
    Stale,
}

type OnComplete = Box<dyn FnOnce() + Send + Sync>;

struct ActiveCountdown {
    handle: TimerHandle,
    remaining: u32,
    on_complete: Option<OnComplete>,
}

/// Single-instance countdown. At most one countdown is live at a time.
#[derive(Default)]
pub struct CooldownTimer {
    generation: u64,
    active: Option<ActiveCountdown>,
}

impl fmt::Debug for CooldownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooldownTimer")
            .field("generation", &self.generation)
            .field("state", &self.state())
            .finish()
    }
}

impl CooldownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, seconds: u32) -> TimerHandle {
        self.arm(seconds, None)
    }

    /// Starts a countdown that runs `on_complete` exactly once when it reaches zero.
    ///
    /// Owners that drive ticks themselves can use [`CooldownTimer::start`] and
    /// observe completion as [`TickOutcome::Completed`] instead; the state machine
    /// does this, since the completing tick is the only place its review can change.
    pub fn start_with<F>(&mut self, seconds: u32, on_complete: F) -> TimerHandle
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.arm(seconds, Some(Box::new(on_complete)))
    }

    fn arm(&mut self, seconds: u32, on_complete: Option<OnComplete>) -> TimerHandle {
        self.generation += 1;
        let handle = TimerHandle(self.generation);
        // Replacing the slot drops any previous callback unfired.
        self.active = Some(ActiveCountdown {
            handle,
            remaining: seconds,
            on_complete,
        });
        if seconds == 0 {
            self.complete();
        }
        handle
    }

    /// Advances the countdown identified by `handle` by one second.
    pub fn tick(&mut self, handle: TimerHandle) -> TickOutcome {
        let Some(active) = self.active.as_mut().filter(|a| a.handle == handle) else {
            return TickOutcome::Stale;
        };
        active.remaining = active.remaining.saturating_sub(1);
        if active.remaining > 0 {
            return TickOutcome::Running {
                remaining: active.remaining,
            };
        }
        self.complete();
        TickOutcome::Completed
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.active.take().and_then(|a| a.on_complete) {
            on_complete();
        }
    }

    /// Cancels the live countdown. Returns `false` if nothing was running.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn active_handle(&self) -> Option<TimerHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.active_handle() == Some(handle)
    }

    pub fn state(&self) -> Option<CooldownState> {
        self.active.as_ref().map(|a| CooldownState {
            remaining_seconds: a.remaining,
            completed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + Sync + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = fired.clone();
        (fired, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_countdown_to_completion() {
        let mut timer = CooldownTimer::new();
        let (fired, on_complete) = counter();
        let handle = timer.start_with(3, on_complete);

        assert_eq!(timer.tick(handle), TickOutcome::Running { remaining: 2 });
        assert_eq!(timer.tick(handle), TickOutcome::Running { remaining: 1 });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // The tick reaching zero fires completion synchronously.
        assert_eq!(timer.tick(handle), TickOutcome::Completed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.state().is_none());

        assert_eq!(timer.tick(handle), TickOutcome::Stale);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_prevents_completion() {
        let mut timer = CooldownTimer::new();
        let (fired, on_complete) = counter();
        let handle = timer.start_with(2, on_complete);

        timer.tick(handle);
        assert!(timer.cancel());
        assert!(!timer.cancel());

        assert_eq!(timer.tick(handle), TickOutcome::Stale);
        assert_eq!(timer.tick(handle), TickOutcome::Stale);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_invalidates_previous_handle() {
        let mut timer = CooldownTimer::new();
        let (first_fired, first_hook) = counter();
        let old = timer.start_with(1, first_hook);
        let new = timer.start(2);

        assert_ne!(old, new);
        assert_eq!(timer.tick(old), TickOutcome::Stale);
        assert_eq!(first_fired.load(Ordering::SeqCst), 0);
        assert_eq!(
            timer.state(),
            Some(CooldownState {
                remaining_seconds: 2,
                completed: false
            })
        );
        assert!(timer.is_active(new));
    }

    #[test]
    fn test_zero_second_start_completes_immediately() {
        let mut timer = CooldownTimer::new();
        let (fired, on_complete) = counter();
        let handle = timer.start_with(0, on_complete);

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_active(handle));
        assert_eq!(timer.tick(handle), TickOutcome::Stale);
    }
}
