/// Subscription store client.
///
/// The backend keeps the user's alert regions on the user record:
/// `GET /api/login/me` returns `{ "user": { "subscribedRegions": [...] } }`
/// and `POST /api/user/subscribe-region` with `{ "regions": [...] }`
/// replaces them. An empty selection is refused before any request is made.

use std::sync::Mutex;

use serde_json::{Value, json};

use crate::ingest::http::BackendClient;
use crate::model::FetchError;
use crate::subscriptions::SubscriptionSet;

pub const CURRENT_USER_PATH: &str = "/api/login/me";
pub const SUBSCRIBE_REGION_PATH: &str = "/api/user/subscribe-region";

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionError {
    /// Saving requires at least one region.
    Empty,
    Fetch(FetchError),
    Parse(String),
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionError::Empty => write!(f, "Please select at least one region"),
            SubscriptionError::Fetch(err) => write!(f, "{}", err),
            SubscriptionError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<FetchError> for SubscriptionError {
    fn from(err: FetchError) -> Self {
        SubscriptionError::Fetch(err)
    }
}

pub trait SubscriptionStore: Send + Sync {
    fn load(&self) -> Result<SubscriptionSet, SubscriptionError>;
    fn save(&self, subscriptions: &SubscriptionSet) -> Result<(), SubscriptionError>;
}

/// Extracts the subscription set from a `/api/login/me` body. A user with
/// no `subscribedRegions` field has no subscriptions.
pub fn parse_current_user(body: &str) -> Result<SubscriptionSet, SubscriptionError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SubscriptionError::Parse(e.to_string()))?;
    let user = value
        .get("user")
        .filter(|u| u.is_object())
        .ok_or_else(|| SubscriptionError::Parse("response has no user object".to_string()))?;

    Ok(user
        .get("subscribedRegions")
        .map(SubscriptionSet::from_backend_value)
        .unwrap_or_default())
}

/// Request body for saving a subscription set.
pub fn subscribe_request_body(subscriptions: &SubscriptionSet) -> Result<Value, SubscriptionError> {
    if subscriptions.is_empty() {
        return Err(SubscriptionError::Empty);
    }
    Ok(json!({ "regions": subscriptions.to_vec() }))
}

pub struct HttpSubscriptionStore {
    client: BackendClient,
}

impl HttpSubscriptionStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl SubscriptionStore for HttpSubscriptionStore {
    fn load(&self) -> Result<SubscriptionSet, SubscriptionError> {
        let body = self.client.get_text(CURRENT_USER_PATH)?;
        parse_current_user(&body)
    }

    fn save(&self, subscriptions: &SubscriptionSet) -> Result<(), SubscriptionError> {
        let body = subscribe_request_body(subscriptions)?;
        self.client.post_json(SUBSCRIBE_REGION_PATH, &body)?;
        Ok(())
    }
}

/// Keeps subscriptions in memory. Used by dev mode and when no backend
/// session is configured.
#[derive(Default)]
pub struct MemorySubscriptionStore {
    current: Mutex<SubscriptionSet>,
}

impl MemorySubscriptionStore {
    pub fn new(initial: SubscriptionSet) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn load(&self) -> Result<SubscriptionSet, SubscriptionError> {
        self.current
            .lock()
            .map(|set| set.clone())
            .map_err(|_| SubscriptionError::Parse("subscription store poisoned".to_string()))
    }

    fn save(&self, subscriptions: &SubscriptionSet) -> Result<(), SubscriptionError> {
        subscribe_request_body(subscriptions)?;
        let mut current = self
            .current
            .lock()
            .map_err(|_| SubscriptionError::Parse("subscription store poisoned".to_string()))?;
        *current = subscriptions.clone();
        Ok(())
    }
}
