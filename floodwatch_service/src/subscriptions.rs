//! The user's region subscriptions.
//!
//! A `SubscriptionSet` only changes through explicit user action. The set
//! is read by the alert trigger; persisting it is the backend's job (see
//! `ingest::subscriptions`).

use std::collections::BTreeSet;

use serde_json::Value;

use crate::model::StationRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    regions: BTreeSet<String>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_regions<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a set from the backend's `subscribedRegions` field.
    ///
    /// The backend has been seen returning nested arrays such as
    /// `[["pune"], ["pune"]]`; one level of nesting is flattened and
    /// duplicates collapse. Anything that is not a string is ignored.
    pub fn from_backend_value(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            return Self::new();
        };

        let regions = items
            .iter()
            .flat_map(|item| match item {
                Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self { regions }
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains(region)
    }

    /// A station is covered when the user subscribed to its region or
    /// directly to the station itself.
    pub fn covers(&self, station: &StationRecord) -> bool {
        self.contains(&station.region) || self.contains(&station.id)
    }

    pub fn insert(&mut self, region: &str) -> bool {
        self.regions.insert(region.to_string())
    }

    pub fn remove(&mut self, region: &str) -> bool {
        self.regions.remove(region)
    }

    /// Flips membership of `region`. Returns `true` if it is now subscribed.
    pub fn toggle(&mut self, region: &str) -> bool {
        if self.regions.remove(region) {
            false
        } else {
            self.regions.insert(region.to_string());
            true
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.regions.iter().cloned().collect()
    }
}
