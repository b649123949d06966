//! Station refresh polling and the daemon event channel.
//!
//! The poller fetches once immediately and then on every interval. Each
//! fetch runs on its own short-lived thread and is tagged with a
//! monotonically increasing sequence number, so a slow response can be
//! overtaken by a newer one; `ProximityView::on_stations` drops the late
//! arrival.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ingest::predictions::{ParsedStations, StationRepository};
use crate::logging::{self, Component};
use crate::model::{FetchError, Fix, LocationError};

/// Everything the daemon loop reacts to.
#[derive(Debug)]
pub enum DashboardEvent {
    LocationFix(Fix),
    LocationLost(LocationError),
    StationsFetched {
        seq: u64,
        result: Result<ParsedStations, FetchError>,
    },
}

/// Hands out request sequence numbers, starting at 1.
#[derive(Debug, Default)]
pub struct RequestSequence {
    last: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Fetches on a detached worker and posts the result to `events`.
pub fn spawn_fetch(
    repository: Arc<dyn StationRepository>,
    sequence: &RequestSequence,
    events: Sender<DashboardEvent>,
) -> std::io::Result<u64> {
    let seq = sequence.next();
    thread::Builder::new()
        .name(format!("station-fetch-{}", seq))
        .spawn(move || {
            let result = repository.fetch_stations();
            // Receiver gone means the daemon is shutting down.
            let _ = events.send(DashboardEvent::StationsFetched { seq, result });
        })?;
    Ok(seq)
}

pub struct PollerHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    sequence: Arc<RequestSequence>,
}

impl PollerHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Sequence number of the most recent request issued.
    pub fn last_issued(&self) -> u64 {
        self.sequence.last_issued()
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                logging::error(Component::Stations, None, "Station poller thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub struct StationPoller {
    repository: Arc<dyn StationRepository>,
    interval: Duration,
}

impl StationPoller {
    pub fn new(repository: Arc<dyn StationRepository>, interval: Duration) -> Self {
        Self { repository, interval }
    }

    pub fn start(self, events: Sender<DashboardEvent>) -> std::io::Result<PollerHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let sequence = Arc::new(RequestSequence::new());
        let worker_sequence = Arc::clone(&sequence);

        let worker = thread::Builder::new()
            .name("station-poller".to_string())
            .spawn(move || {
                loop {
                    match spawn_fetch(Arc::clone(&self.repository), &worker_sequence, events.clone()) {
                        Ok(seq) => logging::debug(
                            Component::Stations,
                            None,
                            &format!("Issued station request #{}", seq),
                        ),
                        Err(e) => logging::error(
                            Component::Stations,
                            None,
                            &format!("Could not start station fetch: {}", e),
                        ),
                    }

                    match stop_rx.recv_timeout(self.interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(PollerHandle {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            sequence,
        })
    }
}
