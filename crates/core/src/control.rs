//! Pause/cancel coordination shared between the engine and a mining worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{RunError, RunResult};

#[derive(Debug, Default)]
struct Flags {
    paused: bool,
    cancelled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    flags: Mutex<Flags>,
    changed: Condvar,
}

/// Paused flag (toggled) plus cancelled latch (one-way), shared by reference.
///
/// Every mutation happens under one lock and wakes all waiters, so a resume
/// can never be lost against a concurrent pause and a cancel always unblocks
/// a paused or sleeping worker.
#[derive(Debug, Clone, Default)]
pub struct RunToken {
    inner: Arc<Inner>,
}

impl RunToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the token was already paused or is cancelled.
    pub fn pause(&self) -> bool {
        let mut flags = self.inner.flags.lock();
        if flags.paused || flags.cancelled {
            return false;
        }
        flags.paused = true;
        self.inner.changed.notify_all();
        true
    }

    /// Returns false if the token was not paused.
    pub fn resume(&self) -> bool {
        let mut flags = self.inner.flags.lock();
        if !flags.paused {
            return false;
        }
        flags.paused = false;
        self.inner.changed.notify_all();
        true
    }

    /// Irreversible. Wakes every waiter.
    pub fn cancel(&self) {
        let mut flags = self.inner.flags.lock();
        flags.cancelled = true;
        self.inner.changed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.flags.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flags.lock().cancelled
    }

    /// Block while paused; fail once cancelled.
    ///
    /// Called at every block boundary of a pattern.
    pub fn checkpoint(&self) -> RunResult<()> {
        let mut flags = self.inner.flags.lock();
        loop {
            if flags.cancelled {
                return Err(RunError::Cancelled);
            }
            if !flags.paused {
                return Ok(());
            }
            self.inner.changed.wait(&mut flags);
        }
    }

    /// Sleep for `duration`, returning early with `Cancelled` if the token
    /// is cancelled meanwhile. Pausing does not stretch a sleep in progress.
    pub fn sleep(&self, duration: Duration) -> RunResult<()> {
        let deadline = Instant::now() + duration;
        let mut flags = self.inner.flags.lock();
        loop {
            if flags.cancelled {
                return Err(RunError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(());
            }
            self.inner.changed.wait_until(&mut flags, deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_checkpoint_passes_when_running() {
        let token = RunToken::new();
        assert!(token.checkpoint().is_ok());
    }

    #[test]
    fn test_pause_resume_flags() {
        let token = RunToken::new();
        assert!(token.pause());
        assert!(!token.pause());
        assert!(token.is_paused());
        assert!(token.resume());
        assert!(!token.resume());
        assert!(!token.is_paused());
    }

    #[test]
    fn test_cannot_pause_after_cancel() {
        let token = RunToken::new();
        token.cancel();
        assert!(!token.pause());
        assert!(token.checkpoint().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_resume_unblocks_checkpoint() {
        let token = RunToken::new();
        token.pause();
        let worker = {
            let token = token.clone();
            thread::spawn(move || token.checkpoint())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!worker.is_finished());
        token.resume();
        assert!(worker.join().unwrap().is_ok());
    }

    #[test]
    fn test_cancel_while_paused_unblocks() {
        let token = RunToken::new();
        token.pause();
        let worker = {
            let token = token.clone();
            thread::spawn(move || token.checkpoint())
        };
        thread::sleep(Duration::from_millis(50));
        token.cancel();
        let result = worker.join().unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancel_interrupts_sleep() {
        let token = RunToken::new();
        let started = Instant::now();
        let worker = {
            let token = token.clone();
            thread::spawn(move || token.sleep(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(50));
        token.cancel();
        assert!(worker.join().unwrap().unwrap_err().is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_sleep_completes() {
        let token = RunToken::new();
        let started = Instant::now();
        token.sleep(Duration::from_millis(20)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
