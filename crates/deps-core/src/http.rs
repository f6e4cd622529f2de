//! Thin HTTP client shared by resolution sources.

use crate::error::{DepsError, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default request timeout for packager requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("deps-merge/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper with deps-merge error mapping.
///
/// A `404` is reported as [`HttpStatus::NotFound`] so callers can turn it into
/// a domain-specific [`DepsError::NotFound`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
}

/// Outcome of a GET request that completed at the HTTP level.
#[derive(Debug)]
pub enum HttpStatus {
    Ok(Bytes),
    NotFound,
}

impl HttpClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches the body of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Http`] on transport failures and
    /// [`DepsError::Status`] for non-success statuses other than 404.
    pub async fn get_bytes(&self, url: &str) -> Result<HttpStatus> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("{} returned 404", url);
            return Ok(HttpStatus::NotFound);
        }

        if !status.is_success() {
            return Err(DepsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tracing::trace!("{} returned {} bytes", url, body.len());
        Ok(HttpStatus::Ok(body))
    }

    /// Fetches and deserializes a JSON document, `None` on 404.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        match self.get_bytes(url).await? {
            HttpStatus::Ok(body) => Ok(Some(serde_json::from_slice(&body)?)),
            HttpStatus::NotFound => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_bytes_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/doc.json")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/doc.json", server.url());
        let result = client.get_bytes(&url).await.unwrap();

        match result {
            HttpStatus::Ok(body) => assert_eq!(&body[..], br#"{"ok":true}"#),
            HttpStatus::NotFound => panic!("Expected body"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_json_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.json")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/missing.json", server.url());
        let result: Option<serde_json::Value> = client.get_json(&url).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/broken.json")
            .with_status(500)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/broken.json", server.url());
        let err = client.get_bytes(&url).await.unwrap_err();
        assert!(matches!(err, DepsError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_get_json_invalid_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/garbage.json")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/garbage.json", server.url());
        let err = client
            .get_json::<serde_json::Value>(&url)
            .await
            .unwrap_err();
        assert!(matches!(err, DepsError::Json(_)));
    }
}
