//! Remote API access.
//!
//! [`RemoteGateway`] is the seam between the sync coordinator and the
//! network. [`HttpGateway`] talks to the restaurant review REST API with
//! `reqwest`; [`MockGateway`](crate::MockGateway) stands in for it in tests.
//!
//! # Example
//!
//! ```no_run
//! use restaurant_sync::{HttpGateway, RemoteGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new("http://localhost:1337")?;
//!
//! for restaurant in gateway.fetch_restaurants().await? {
//!     println!("{}: {}", restaurant.id, restaurant.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use restaurant_types::{Restaurant, Review, ReviewDraft};

use crate::error::{Error, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the sync layer needs from the remote API.
///
/// Implementations do not retry; a failed call returns its error at once.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// `GET /restaurants`
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>>;

    /// `GET /reviews/?restaurant_id=<id>`
    async fn fetch_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>>;

    /// `POST /reviews/`. The server assigns `id` and `createdAt`.
    async fn create_review(&self, draft: &ReviewDraft) -> Result<Review>;

    /// `PUT /restaurants/<id>/?is_favorite=<bool>`, returning the updated
    /// restaurant.
    async fn set_favorite(&self, restaurant_id: i64, is_favorite: bool) -> Result<Restaurant>;

    /// Connectivity probe.
    async fn is_reachable(&self) -> bool;
}

/// HTTP gateway for the restaurant review API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `http://localhost:1337`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a gateway with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Client)?;
        Self::with_client(base_url, client)
    }

    /// Create a gateway with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        debug!("Requesting {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| Error::NetworkUnavailable {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        self.handle_response(url, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::NetworkUnavailable {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        if status.is_success() {
            serde_json::from_str(&body)
                .map_err(|e| Error::MalformedResponse(format!("{}: {}", url, e)))
        } else {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .or_else(|| v.get("message"))
                        .and_then(|e| e.as_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| status.to_string());

            Err(Error::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>> {
        let url = format!("{}/restaurants", self.base_url);
        self.send(self.client.get(&url), &url).await
    }

    async fn fetch_reviews(&self, restaurant_id: i64) -> Result<Vec<Review>> {
        let url = format!("{}/reviews/?restaurant_id={}", self.base_url, restaurant_id);
        self.send(self.client.get(&url), &url).await
    }

    async fn create_review(&self, draft: &ReviewDraft) -> Result<Review> {
        let url = format!("{}/reviews/", self.base_url);
        self.send(self.client.post(&url).json(draft), &url).await
    }

    async fn set_favorite(&self, restaurant_id: i64, is_favorite: bool) -> Result<Restaurant> {
        let url = format!(
            "{}/restaurants/{}/?is_favorite={}",
            self.base_url, restaurant_id, is_favorite
        );
        self.send(self.client.put(&url), &url).await
    }

    async fn is_reachable(&self) -> bool {
        self.fetch_restaurants().await.is_ok()
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    // Normalize URL (remove trailing slash)
    let base_url = base_url.trim().trim_end_matches('/');

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url.to_string())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    const RESTAURANTS: &str = r#"[
        {
            "id": 1,
            "name": "Mission Chinese Food",
            "neighborhood": "Manhattan",
            "photograph": "1",
            "address": "171 E Broadway, New York, NY 10002",
            "latlng": {"lat": 40.713829, "lng": -73.989667},
            "cuisine_type": "Asian",
            "operating_hours": {"Monday": "5:30 pm - 11:00 pm"},
            "createdAt": 1504095567183,
            "updatedAt": "2018-06-08T15:28:21.000Z",
            "is_favorite": "false"
        }
    ]"#;

    /// Answer exactly one request with a canned response; the handle yields
    /// the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    async fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = HttpGateway::new("http://localhost:1337").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:1337");
    }

    #[test]
    fn test_gateway_normalizes_url() {
        let gateway = HttpGateway::new("http://localhost:1337/").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:1337");
    }

    #[test]
    fn test_gateway_invalid_url() {
        let result = HttpGateway::new("localhost:1337");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_restaurants_decodes_loose_json() {
        let (base_url, server) = serve_once("200 OK", RESTAURANTS).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let restaurants = gateway.fetch_restaurants().await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /restaurants HTTP/1.1"));
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "Mission Chinese Food");
        assert!(!restaurants[0].is_favorite);
    }

    #[tokio::test]
    async fn test_fetch_reviews_uses_restaurant_query() {
        let body = r#"[{"id": 1, "restaurant_id": "3", "name": "Steve", "rating": "4",
                        "comments": "Good", "createdAt": 1504095567183}]"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let reviews = gateway.fetch_reviews(3).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /reviews/?restaurant_id=3 HTTP/1.1"));
        assert_eq!(reviews[0].restaurant_id, 3);
        assert_eq!(reviews[0].rating, 4);
    }

    #[tokio::test]
    async fn test_create_review_posts_draft() {
        let body = r#"{"id": 31, "restaurant_id": 2, "name": "Ana", "rating": 5,
                       "comments": "Lovely", "createdAt": "2018-06-08T15:28:21.000Z"}"#;
        let (base_url, server) = serve_once("201 Created", body).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let review = gateway
            .create_review(&ReviewDraft::new(2, "Ana", 5, "Lovely"))
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /reviews/ HTTP/1.1"));
        assert!(request.contains(r#""restaurant_id":2"#));
        assert!(request.contains(r#""rating":5"#));
        assert_eq!(review.id, 31);
    }

    #[tokio::test]
    async fn test_set_favorite_uses_put_query() {
        let body = r#"{"id": 1, "name": "Mission Chinese Food",
                       "latlng": {"lat": 40.7, "lng": -73.9},
                       "createdAt": 1504095567183, "is_favorite": "true"}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let restaurant = gateway.set_favorite(1, true).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("PUT /restaurants/1/?is_favorite=true HTTP/1.1"));
        assert!(restaurant.is_favorite);
    }

    #[tokio::test]
    async fn test_server_error_message() {
        let (base_url, _server) =
            serve_once("500 Internal Server Error", r#"{"error": "database down"}"#).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let err = gateway.fetch_restaurants().await.unwrap_err();
        match err {
            Error::ServerError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (base_url, _server) = serve_once("200 OK", r#"{"not": "a list"}"#).await;
        let gateway = HttpGateway::new(&base_url).unwrap();

        let err = gateway.fetch_restaurants().await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let gateway = HttpGateway::new(&closed_port_url().await).unwrap();

        let err = gateway.fetch_reviews(1).await.unwrap_err();
        assert!(err.is_network());
        assert!(!gateway.is_reachable().await);
    }
}
