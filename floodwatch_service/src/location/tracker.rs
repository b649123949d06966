//! Background location tracking.
//!
//! `start_tracking` runs a provider on its own thread and hands every fresh
//! fix to `on_update`. A provider error is delivered once to `on_error` and
//! ends tracking; nothing retries behind the caller's back. The returned
//! handle stops the worker on `stop()` or when dropped, which releases the
//! provider.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use crate::location::provider::LocationProvider;
use crate::location::staleness::{DEFAULT_MAX_FIX_AGE_SECS, is_fix_stale_at};
use crate::logging::{self, Component};
use crate::model::{Fix, LocationError};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Pause between consecutive fixes.
    pub interval: StdDuration,
    /// Fixes older than this are discarded.
    pub max_fix_age: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(1),
            max_fix_age: Duration::seconds(DEFAULT_MAX_FIX_AGE_SECS),
        }
    }
}

/// Owns the tracking worker. Dropping it stops tracking.
pub struct TrackingHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TrackingHandle {
    /// Stops the worker and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map(|w| w.is_finished()).unwrap_or(true)
    }

    fn shutdown(&mut self) {
        // Dropping the sender also wakes the worker.
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                logging::error(Component::Location, None, "Location tracker thread panicked");
            }
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Starts pulling fixes from `provider` on a background thread.
pub fn start_tracking<P, U, E>(
    mut provider: P,
    settings: TrackerSettings,
    mut on_update: U,
    mut on_error: E,
) -> std::io::Result<TrackingHandle>
where
    P: LocationProvider + 'static,
    U: FnMut(Fix) + Send + 'static,
    E: FnMut(LocationError) + Send + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let worker = thread::Builder::new()
        .name("location-tracker".to_string())
        .spawn(move || {
            loop {
                match provider.next_fix() {
                    Ok(Some(fix)) => {
                        if is_fix_stale_at(&fix, settings.max_fix_age, Utc::now()) {
                            logging::debug(
                                Component::Location,
                                None,
                                &format!("Discarded stale fix from {}", fix.timestamp.to_rfc3339()),
                            );
                        } else {
                            on_update(fix);
                        }
                    }
                    Ok(None) => {
                        logging::info(Component::Location, None, "Location provider finished");
                        break;
                    }
                    Err(err) => {
                        on_error(err);
                        break;
                    }
                }

                match stop_rx.recv_timeout(settings.interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;

    Ok(TrackingHandle {
        stop_tx: Some(stop_tx),
        worker: Some(worker),
    })
}
