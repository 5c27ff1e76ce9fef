//! Background worker plumbing shared by both pollers.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::info;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// The signal is observed at the sleep boundary only; an in-flight cycle
    /// finishes first.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Spawn a fixed-interval polling worker.
///
/// Runs `cycle` immediately, then sleeps `interval` between runs. The sleep
/// doubles as the shutdown check: a signal (or a dropped handle) ends the
/// loop there.
pub fn spawn_polling_worker<F>(name: &'static str, interval: Duration, mut cycle: F) -> WorkerHandle
where
    F: FnMut() + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            info!(worker = name, "worker started");
            loop {
                cycle();

                match shutdown_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            info!(worker = name, "worker stopped");
        })
        .expect("failed to spawn polling worker thread");

    WorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
    }
}
