//! Authenticated HTTP access to the RouterOS REST API
//!
//! Every request goes to `<base_url>/rest/<path>` with HTTP basic
//! authentication. Any status outside 200..=299 becomes
//! [`Error::Request`](rosdns_core::Error::Request); the response body is
//! captured for diagnostics but never parsed. There is no retry here.

use reqwest::{Method, StatusCode};
use rosdns_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport bound to one router
pub struct Transport {
    /// Base URL without trailing slash
    base_url: String,

    /// API user name
    username: String,

    /// API password
    /// ⚠️ NEVER log this value
    password: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl Transport {
    /// Create a transport for one router
    ///
    /// # Parameters
    ///
    /// - `base_url`: Router URL, e.g. `https://192.168.88.1`
    /// - `username` / `password`: Basic-auth credentials
    /// - `skip_tls_verify`: Accept self-signed certificates
    /// - `timeout`: Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        skip_tls_verify: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if skip_tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the router connection");
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return the raw response body
    ///
    /// # Parameters
    ///
    /// - `method`: HTTP method
    /// - `path`: Path below `/rest/`, e.g. `ip/dns/static`
    /// - `query`: Query parameters, URL-encoded onto the request
    /// - `body`: Optional JSON body
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: Body of a 2xx response
    /// - `Err(Error::Request)`: Non-2xx status
    /// - `Err(Error::Http)`: The request never produced a response
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let url = format!("{}/rest/{}", self.base_url, path);
        tracing::debug!("Sending {} request to: {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.username, Some(&self.password));

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Error sending {} request to {}: {}", method, path, e);
            Error::http(format!("{} {} failed: {}", method, path, e))
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !is_success(status) {
            tracing::error!(
                "Request {} {} failed with status {}, response: {}",
                method,
                path,
                status,
                text
            );
            return Err(Error::request(method.as_str(), path, status.as_u16(), text));
        }

        tracing::debug!("Request {} {} succeeded with status {}", method, path, status);
        Ok(text)
    }

    /// GET `path` and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.execute(Method::GET, path, query, None).await?;
        decode_body(path, &body)
    }

    /// PUT a JSON body to `path` and decode the JSON response
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.execute(Method::PUT, path, &[], Some(body)).await?;
        decode_body(path, &response)
    }

    /// DELETE `path`, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}

fn decode_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Error decoding response body from {}: {}", path, e);
        Error::Json(e)
    })
}

/// Whether `status` is inside the success range accepted by [`Transport`]
pub fn is_success(status: StatusCode) -> bool {
    (200..=299).contains(&status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> Transport {
        Transport::new(base_url, "admin", "secret_password_123", false, DEFAULT_HTTP_TIMEOUT).unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(transport("https://192.168.88.1/").base_url(), "https://192.168.88.1");
        assert_eq!(transport("https://192.168.88.1").base_url(), "https://192.168.88.1");
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let debug_str = format!("{:?}", transport("https://router.lan"));
        assert!(!debug_str.contains("secret_password_123"));
        assert!(debug_str.contains("<REDACTED>"));
        assert!(debug_str.contains("Transport"));
    }

    #[test]
    fn test_success_range() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::NO_CONTENT));
        assert!(!is_success(StatusCode::NOT_FOUND));
        assert!(!is_success(StatusCode::MULTIPLE_CHOICES));
    }

    #[test]
    fn test_decode_body_error_is_json() {
        let result: Result<Vec<serde_json::Value>> = decode_body("ip/dns/static", "<html>");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
