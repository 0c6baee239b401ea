//! Fixed-interval background tasks with cooperative cancellation
//!
//! Both periodic processes of the server (the address-space sync tick and the
//! simulation sweep) run on a [`PeriodicTask`]: a named thread that waits on a
//! [`crossbeam_channel::tick`] ticker and a stop channel at the same time.
//!
//! # Stopping
//!
//! [`PeriodicTask::stop`] disconnects the stop channel. The thread notices
//! either while waiting for the next tick (immediately) or right after the
//! iteration it is currently running, so an in-flight iteration always
//! completes. `stop` then waits for the thread to exit with a bounded timeout
//! and joins it; once `stop` returns `Ok`, the work closure will never run
//! again.
//!
//! A panicking iteration is logged and the task keeps its schedule.

use crate::error::{AssetServerError, Result};
use crossbeam_channel::{bounded, select, tick, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

/// When the first iteration runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRun {
    /// Run once right after spawning, then every interval
    Immediately,
    /// Wait one full interval before the first run
    #[default]
    AfterInterval,
}

/// A named thread running a closure at a fixed interval until stopped
pub struct PeriodicTask {
    name: String,
    interval: Duration,
    stop_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn a new periodic task
    pub fn spawn<F>(
        name: impl Into<String>,
        interval: Duration,
        first_run: FirstRun,
        mut work: F,
    ) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        if interval.is_zero() {
            return Err(AssetServerError::Config(format!(
                "interval of task '{}' must be greater than zero",
                name
            )));
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        // Never sent on; dropping the sender at thread exit wakes `stop`.
        let (done_tx, done_rx) = bounded::<()>(0);
        let thread_name = name.clone();

        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _done = done_tx;
                tracing::debug!(task = %thread_name, ?interval, "Periodic task started");

                if first_run == FirstRun::Immediately {
                    run_iteration(&thread_name, &mut work);
                }

                let ticker = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if stop_requested(&stop_rx) {
                                break;
                            }
                            run_iteration(&thread_name, &mut work);
                        }
                    }
                }

                tracing::debug!(task = %thread_name, "Periodic task stopped");
            })?;

        Ok(Self {
            name,
            interval,
            stop_tx: Some(stop_tx),
            done_rx,
            handle: Some(handle),
        })
    }

    /// Task name (also the thread name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interval between iterations
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True until the task has been stopped and its thread has exited
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task to stop and wait up to `timeout` for it to exit.
    ///
    /// Calling `stop` on an already stopped task is a no-op.
    pub fn stop(&mut self, timeout: Duration) -> Result<()> {
        self.signal_stop();
        self.wait(timeout)
    }

    /// Ask the task to stop without waiting for it.
    ///
    /// Lets several tasks wind down in parallel before each is waited on.
    pub(crate) fn signal_stop(&mut self) {
        // Dropping the only sender disconnects the channel, which wakes `select!`
        self.stop_tx.take();
    }

    /// Wait up to `timeout` for a signalled task to exit, then join it
    pub(crate) fn wait(&mut self, timeout: Duration) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) | Ok(()) => {
                if handle.join().is_err() {
                    tracing::error!(task = %self.name, "Periodic task thread panicked");
                }
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                self.handle = Some(handle);
                tracing::error!(task = %self.name, ?timeout, "Periodic task did not stop in time");
                Err(AssetServerError::Timeout(format!(
                    "task '{}' did not stop within {:?}",
                    self.name, timeout
                )))
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn run_iteration<F: FnMut()>(name: &str, work: &mut F) {
    if catch_unwind(AssertUnwindSafe(|| work())).is_err() {
        tracing::error!(task = %name, "Periodic task iteration panicked, continuing");
    }
}
