//! Mouse tracking exit guard.
//!
//! A [`TrackingGuard`] is held while a session has mouse reporting turned
//! on. The panic hook is installed once per process and writes the disable
//! sequence to stdout while any guard is alive, so a crashing application
//! does not leave the terminal spewing mouse reports into the shell.

use std::io::{self, Write};
use std::panic;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::renderer::ansi;

static ACTIVE: AtomicUsize = AtomicUsize::new(0);
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// Counts one session with tracking enabled for as long as it lives.
#[derive(Debug)]
pub struct TrackingGuard {
    armed: bool,
}

impl TrackingGuard {
    pub fn arm(install_hook: bool) -> Self {
        if install_hook {
            install_panic_hook();
        }
        ACTIVE.fetch_add(1, Ordering::SeqCst);
        Self { armed: true }
    }

    /// Release without waiting for drop.
    pub fn disarm(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.armed {
            self.armed = false;
            ACTIVE.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Number of live guards in this process.
pub fn active() -> usize {
    ACTIVE.load(Ordering::SeqCst)
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if active() > 0 {
                let mut stdout = io::stdout();
                let _ = ansi::disable_mouse(&mut stdout);
                let _ = stdout.flush();
            }
            previous(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_counts() {
        // Tests run in parallel; other guards may be alive
        let guard = TrackingGuard::arm(false);
        assert!(active() >= 1);
        guard.disarm();

        let mut guard = TrackingGuard::arm(false);
        guard.release();
        guard.release();
        assert!(!guard.armed);
    }
}
