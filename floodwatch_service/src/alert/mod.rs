//! Proximity alerting.
//!
//! - `severity`: ordering and marker colours for backend risk labels.
//! - `proximity`: which nearby stations deserve an alert, and when.
//! - `forecast`: the recent forecast alerts feed.

pub mod forecast;
pub mod proximity;
pub mod severity;
