use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::Result;

/// Process-wide stop request. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

// The handler can only reach process globals; it does a single atomic store.
static SIGNAL_TARGET: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_terminate(_signum: libc::c_int) {
    if let Some(flag) = SIGNAL_TARGET.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Routes SIGINT and SIGTERM to `flag`.
///
/// Only the first flag registered in a process receives signals.
pub fn register_signal_handlers(flag: &ShutdownFlag) -> Result<()> {
    if SIGNAL_TARGET.set(Arc::clone(&flag.requested)).is_err() {
        log::warn!("signal handlers already installed; keeping the first shutdown flag");
        return Ok(());
    }

    for signum in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: `action` is fully initialised before use and the handler is
        // async-signal-safe (one atomic store on a value that is never freed).
        let rc = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signum, &action, std::ptr::null_mut())
        };
        if rc != 0 {
            return Err(io::Error::last_os_error().into());
        }
    }
    log::debug!("installed SIGINT/SIGTERM handlers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_request() {
        let flag = ShutdownFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_requested());
        flag.request();
        assert!(observer.is_requested());
    }

    #[test]
    fn sigint_and_sigterm_set_the_registered_flag() {
        let flag = ShutdownFlag::new();
        register_signal_handlers(&flag).unwrap();
        assert!(!flag.is_requested());

        unsafe { libc::raise(libc::SIGINT) };
        assert!(flag.is_requested());

        flag.requested.store(false, Ordering::SeqCst);
        unsafe { libc::raise(libc::SIGTERM) };
        assert!(flag.is_requested());
    }
}
