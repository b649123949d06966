//! Location tracking.
//!
//! - `provider`: the `LocationProvider` seam plus fixed and replay sources.
//! - `staleness`: rejects fixes older than the configured bound.
//! - `tracker`: background worker that feeds fixes to the view until stopped.

pub mod provider;
pub mod staleness;
pub mod tracker;

pub use provider::{FixedLocationProvider, LocationProvider, ReplayLocationProvider, TrackPoint};
pub use tracker::{TrackerSettings, TrackingHandle, start_tracking};
