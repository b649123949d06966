//! Flood proximity service.
//!
//! Tracks the user's position, ranks flood monitoring stations
//! nearest-first, and raises an alert when the user comes within the
//! proximity threshold of a subscribed station whose forecast risk is
//! above Safe.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod dev_mode;
pub mod ingest;
pub mod location;
pub mod logging;
pub mod model;
pub mod poller;
pub mod subscriptions;
pub mod verify;
