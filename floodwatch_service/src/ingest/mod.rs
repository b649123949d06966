//! Backend API clients.
//!
//! - `http`: shared reqwest client carrying the user's credentials.
//! - `predictions`: station list from the prediction endpoint, parsed leniently.
//! - `subscriptions`: the user's region subscriptions.

pub mod http;
pub mod predictions;
pub mod subscriptions;
