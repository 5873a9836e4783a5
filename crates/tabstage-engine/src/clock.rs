//! Clock and timer abstraction for debounced completion scheduling.
//!
//! Mirrors the host contract: `after_func` schedules a callback, and
//! `Timer::stop` reports whether it prevented the callback from firing.
//! Tests inject a manual clock instead of sleeping.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// A scheduled callback that can be stopped before it fires.
pub trait Timer: Send + Sync {
    /// Returns true iff the call prevented the callback from firing.
    fn stop(&self) -> bool;
}

/// Time source with deferred execution, injectable for tests.
pub trait Clock: Send + Sync {
    fn after_func(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> Box<dyn Timer>;
    fn now(&self) -> Instant;
}

/// Default clock backed by one spawned thread per timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Pending,
    Stopped,
    Fired,
}

struct SystemTimer {
    state: Arc<(Mutex<TimerState>, Condvar)>,
}

impl Timer for SystemTimer {
    fn stop(&self) -> bool {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().expect("timer state lock poisoned");
        if *state == TimerState::Pending {
            *state = TimerState::Stopped;
            cvar.notify_all();
            true
        } else {
            false
        }
    }
}

impl Clock for SystemClock {
    fn after_func(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> Box<dyn Timer> {
        let state = Arc::new((Mutex::new(TimerState::Pending), Condvar::new()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            let (lock, cvar) = &*shared;
            let deadline = Instant::now() + delay;
            let mut guard = lock.lock().expect("timer state lock poisoned");
            loop {
                if *guard != TimerState::Pending {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    *guard = TimerState::Fired;
                    break;
                }
                guard = cvar
                    .wait_timeout(guard, deadline - now)
                    .expect("timer state lock poisoned")
                    .0;
            }
            drop(guard);
            callback();
        });
        Box::new(SystemTimer { state })
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_stop_before_fire_prevents_callback() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = SystemClock.after_func(
            Duration::from_millis(200),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        assert!(timer.stop());
        thread::sleep(Duration::from_millis(300));
        assert!(!fired.load(Ordering::SeqCst));
        // A second stop reports that nothing was prevented.
        assert!(!timer.stop());
    }

    #[test]
    fn test_stop_after_fire_returns_false() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = SystemClock.after_func(
            Duration::from_millis(10),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        thread::sleep(Duration::from_millis(200));
        assert!(fired.load(Ordering::SeqCst));
        assert!(!timer.stop());
    }

    #[test]
    fn test_now_advances() {
        let clock = SystemClock;
        let before = clock.now();
        thread::sleep(Duration::from_millis(5));
        assert!(clock.now() > before);
    }
}
