//! Process interrupt wiring for a running chat session.

use std::io;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use chat_store::CancelSignal;
use signal_hook::iterator::{Handle, Signals};
use tracing::debug;

/// Stops forwarding signals and joins the listener thread on drop.
pub struct InterruptGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Sets `flag` on SIGINT or SIGTERM while the returned guard is alive.
pub fn install_interrupt_handler(flag: CancelSignal) -> io::Result<InterruptGuard> {
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("relay-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                debug!(signal, "interrupt signal received");
                flag.store(true, Ordering::Release);
            }
        })?;

    Ok(InterruptGuard {
        handle,
        thread: Some(thread),
    })
}
