/// Authenticated HTTP access to the flood prediction backend.
///
/// The backend authenticates with a session cookie (what a browser sends
/// with `withCredentials`) or a bearer token; whichever is configured is
/// attached to every request.

use std::time::Duration;

use crate::config::ApiConfig;
use crate::model::FetchError;

#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::blocking::Client,
    base_url: String,
    session_cookie: Option<String>,
    api_token: Option<String>,
}

impl BackendClient {
    pub fn new(api: &ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(api.fetch_timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            session_cookie: api.session_cookie.clone(),
            api_token: api.api_token.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        build_url(&self.base_url, path)
    }

    /// GET `path` and return the body of a 2xx response.
    pub fn get_text(&self, path: &str) -> Result<String, FetchError> {
        let request = self.client.get(self.url(path));
        self.send(request)
    }

    /// POST a JSON body to `path` and return the body of a 2xx response.
    pub fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        let request = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body.to_string());
        self.send(request)
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<String, FetchError> {
        let mut request = request.header("Accept", "application/json");
        if let Some(cookie) = &self.session_cookie {
            request = request.header("Cookie", cookie.as_str());
        }
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(classify_transport_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        response.text().map_err(classify_transport_error)
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Joins the base URL and an absolute API path without doubling slashes.
pub fn build_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_normalizes_slashes() {
        assert_eq!(
            build_url("https://api.example.org/", "/api/predict-flood"),
            "https://api.example.org/api/predict-flood"
        );
        assert_eq!(
            build_url("https://api.example.org", "api/login/me"),
            "https://api.example.org/api/login/me"
        );
    }

    #[test]
    fn test_client_uses_configured_base_url() {
        let api = ApiConfig {
            base_url: "https://api.example.org/".to_string(),
            ..ApiConfig::default()
        };
        let client = BackendClient::new(&api).expect("client builds");
        assert_eq!(client.url("/api/predict-flood"), "https://api.example.org/api/predict-flood");
    }
}
