//! Signal handling for interactive sessions
//!
//! Ctrl+C interrupts the running turn instead of killing the process. A
//! second Ctrl+C within two seconds requests shutdown.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info};

use crate::Result;

/// Window in which a second interrupt means shutdown
const DOUBLE_INTERRUPT_WINDOW: Duration = Duration::from_secs(2);

/// Interrupt flag that async code can wait on
#[derive(Debug, Default)]
pub struct InterruptSignal {
    flag: AtomicBool,
    notify: Notify,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the interrupt and wake every waiter
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Drop any pending interrupt
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Wait until an interrupt is raised, consuming it
    pub async fn wait(&self) {
        loop {
            // Register before checking so a trigger in between is not lost
            let notified = self.notify.notified();
            if self.flag.swap(false, Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// Signal handler for the interactive session
pub struct SignalHandler {
    /// Raised on every Ctrl+C
    interrupts: Arc<InterruptSignal>,
    /// Set on the second Ctrl+C
    shutdown_flag: Arc<AtomicBool>,
    /// Count of interrupts inside the current window
    interrupt_count: Arc<AtomicUsize>,
}

impl SignalHandler {
    pub fn new(interrupts: Arc<InterruptSignal>, shutdown_flag: Arc<AtomicBool>) -> Self {
        Self {
            interrupts,
            shutdown_flag,
            interrupt_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Install the Ctrl+C handler
    pub fn install(&self) -> Result<()> {
        let interrupts = self.interrupts.clone();
        let shutdown_flag = self.shutdown_flag.clone();
        let interrupt_count = self.interrupt_count.clone();

        ctrlc::set_handler(move || {
            let count = interrupt_count.fetch_add(1, Ordering::SeqCst);

            if count == 0 {
                debug!("First interrupt received");

                // Reset count after the window so a double Ctrl+C must be quick
                let count_clone = interrupt_count.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(DOUBLE_INTERRUPT_WINDOW);
                    count_clone.store(0, Ordering::SeqCst);
                });
            } else {
                info!("Second interrupt received, shutting down");
                shutdown_flag.store(true, Ordering::SeqCst);
            }
            interrupts.trigger();
        })
        .map_err(|e| crate::Error::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}

/// Install a panic handler that prints a short crash banner
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let msg = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = info
            .location()
            .map(|loc| format!(" at {}:{}", loc.file(), loc.line()))
            .unwrap_or_default();

        eprintln!("\n\x1b[31m╭────────────────────────────────────────╮\x1b[0m");
        eprintln!("\x1b[31m│  conduit crashed unexpectedly          │\x1b[0m");
        eprintln!("\x1b[31m╰────────────────────────────────────────╯\x1b[0m");
        eprintln!("\n\x1b[33mError:\x1b[0m {}{}\n", msg, location);
    }));
}
