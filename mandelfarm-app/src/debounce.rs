use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use tracing::trace;

/// Collapses bursts of triggers into a single action.
///
/// The action runs on a background thread once `delay` has passed with no
/// further trigger.  Each trigger restarts the wait.  Dropping the debouncer
/// discards any pending action and joins the thread.
pub struct Debouncer {
    triggers: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new<F>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<()>();
        let thread = thread::Builder::new()
            .name("mandelfarm-debounce".into())
            .spawn(move || {
                // Idle until a burst starts.
                while rx.recv().is_ok() {
                    loop {
                        match rx.recv_timeout(delay) {
                            Ok(()) => trace!("Debounce restarted"),
                            Err(RecvTimeoutError::Timeout) => {
                                action();
                                break;
                            }
                            Err(RecvTimeoutError::Disconnected) => return,
                        }
                    }
                }
            })
            .expect("Failed to spawn debounce thread");

        Self {
            triggers: Some(tx),
            thread: Some(thread),
        }
    }

    /// Schedule the action, replacing any pending one.
    pub fn trigger(&self) {
        if let Some(tx) = &self.triggers {
            let _ = tx.send(());
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        // Disconnecting wakes the thread, which exits without firing.
        self.triggers.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
