//! HTTP client for the marketplace backend.
//!
//! Implements [`RemoteFavorites`] over the REST API and fetches the profile
//! used to restore a session from a stored token.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;

use crate::application::parser::{
    parse_favorite_statuses, parse_favorites_page, parse_is_liked, parse_profile,
};
use crate::application::RemoteFavorites;
use crate::domain::{
    AppConfig, AppError, FavoriteStatus, FavoritesPage, PropertyId, Result, UserProfile,
};

const CHECK_FAVORITES_PATH: &str = "/users/checkMultipleFavorites";
const FAVORITES_PATH: &str = "/users/favorites";
const TOGGLE_FAVORITE_PATH: &str = "/users/like";
const IS_LIKED_PATH: &str = "/users/isLiked";
const PROFILE_PATH: &str = "/auth/profile";

/// Stateless client bound to one backend and, optionally, one bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig, access_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(AppError::network)?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Whether a bearer token is attached to requests.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(AppError::Unauthenticated)?;
        Ok(request.header(AUTHORIZATION, format!("Bearer {token}")))
    }

    /// Send a request and read the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.authorized(request)?.send().await.map_err(AppError::network)?;
        let response = check_status(response).await?;
        let body = response.bytes().await.map_err(AppError::network)?;
        Ok(body.to_vec())
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    /// Returns `Unauthenticated` without a token or on 401.
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        tracing::debug!("Fetching profile");
        let body = self.execute(self.client.get(self.url(PROFILE_PATH))).await?;
        parse_profile(&body)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthenticated);
    }

    let text = response.text().await.unwrap_or_default();
    Err(AppError::Http {
        status: status.as_u16(),
        message: error_message(status, &text),
    })
}

/// Pulls `message` out of a JSON error body, falling back to the status text.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("message") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[async_trait]
impl RemoteFavorites for ApiClient {
    async fn check_favorites(&self, ids: &[PropertyId]) -> Result<Vec<FavoriteStatus>> {
        tracing::debug!(count = ids.len(), "Batch favorite check");
        let request = self
            .client
            .post(self.url(CHECK_FAVORITES_PATH))
            .json(&json!({ "bienIds": ids }));
        let body = self.execute(request).await?;
        parse_favorite_statuses(&body)
    }

    async fn fetch_favorites_page(&self, page: u32, limit: u32) -> Result<FavoritesPage> {
        let request = self
            .client
            .get(self.url(FAVORITES_PATH))
            .query(&[("page", page), ("limit", limit)]);
        let body = self.execute(request).await?;
        parse_favorites_page(&body, page)
    }

    async fn toggle_favorite(&self, id: &PropertyId) -> Result<()> {
        let request = self
            .client
            .post(self.url(TOGGLE_FAVORITE_PATH))
            .json(&json!({ "bienId": id }));
        self.execute(request).await?;
        Ok(())
    }

    async fn is_favorite(&self, id: &PropertyId) -> Result<bool> {
        let request = self
            .client
            .post(self.url(IS_LIKED_PATH))
            .json(&json!({ "bienId": id }));
        let body = self.execute(request).await?;
        parse_is_liked(&body)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    use super::*;

    fn client(base_url: &str, token: Option<&str>) -> ApiClient {
        let mut config = AppConfig::default();
        config.api.base_url = base_url.to_string();
        ApiClient::new(&config, token.map(String::from)).unwrap()
    }

    /// Serve a single canned response on a local port. The raw request
    /// received comes back on the returned channel.
    async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            let _ = tx.send(request);
        });
        (base_url, rx)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_toggle_posts_bien_id_with_bearer() {
        let (base_url, request) = serve_once("200 OK", "{}").await;
        let api = client(&base_url, Some("tok"));

        api.toggle_favorite(&PropertyId::new("42")).await.unwrap();

        let request = request.await.unwrap();
        let head = request.to_lowercase();
        assert!(head.starts_with("post /users/like http/1.1"), "{request}");
        assert!(head.contains("authorization: bearer tok"), "{request}");
        assert_eq!(request_body(&request), json!({ "bienId": "42" }));
    }

    #[tokio::test]
    async fn test_check_favorites_round_trip() {
        let (base_url, request) = serve_once(
            "200 OK",
            r#"[{"propertyId": 1, "isFavorite": true}, {"propertyId": "2", "isFavorite": false}]"#,
        )
        .await;
        let api = client(&base_url, Some("tok"));

        let statuses = api
            .check_favorites(&[PropertyId::new("1"), PropertyId::new("2")])
            .await
            .unwrap();

        assert_eq!(
            statuses,
            vec![
                FavoriteStatus::new(PropertyId::new("1"), true),
                FavoriteStatus::new(PropertyId::new("2"), false),
            ]
        );
        let request = request.await.unwrap();
        assert!(request.starts_with("POST /users/checkMultipleFavorites "));
        assert_eq!(request_body(&request), json!({ "bienIds": ["1", "2"] }));
    }

    #[tokio::test]
    async fn test_favorites_page_sends_page_and_limit() {
        let (base_url, request) =
            serve_once("200 OK", r#"{"favorites": [3, 4], "page": 2, "totalPages": 2}"#).await;
        let api = client(&base_url, Some("tok"));

        let page = api.fetch_favorites_page(2, 10).await.unwrap();

        assert_eq!(page.property_ids, vec![PropertyId::new("3"), PropertyId::new("4")]);
        assert!(!page.has_more_after(2));
        let request = request.await.unwrap();
        assert!(request.starts_with("GET /users/favorites?page=2&limit=10 "), "{request}");
    }

    #[tokio::test]
    async fn test_401_is_unauthenticated() {
        let (base_url, _request) =
            serve_once("401 Unauthorized", r#"{"message": "Unauthorized"}"#).await;
        let api = client(&base_url, Some("expired"));

        let err = api.fetch_profile().await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_server_error_is_http_with_message() {
        let (base_url, _request) =
            serve_once("500 Internal Server Error", r#"{"message": "boom"}"#).await;
        let api = client(&base_url, Some("tok"));

        let err = api.toggle_favorite(&PropertyId::new("42")).await.unwrap_err();
        assert!(err.is_transient());
        match err {
            AppError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let api = client(&base_url, Some("tok"));

        let err = api.is_favorite(&PropertyId::new("42")).await.unwrap_err();
        assert!(matches!(err, AppError::Network { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_invalid_data() {
        let (base_url, _request) = serve_once("200 OK", "<html>ok</html>").await;
        let api = client(&base_url, Some("tok"));

        let err = api.is_favorite(&PropertyId::new("42")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidData { .. }), "{err:?}");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = client("http://api.example.test/", None);
        assert_eq!(
            api.url(TOGGLE_FAVORITE_PATH),
            "http://api.example.test/users/like"
        );
    }

    #[test]
    fn test_blank_token_is_no_token() {
        assert!(!client("http://x", Some("  ")).has_token());
        assert!(client("http://x", Some("abc")).has_token());
    }

    #[tokio::test]
    async fn test_requests_without_token_are_unauthenticated() {
        // Unroutable address: must fail before any connection attempt.
        let api = client("http://127.0.0.1:9", None);
        let err = api.toggle_favorite(&PropertyId::new("1")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message": "bienId invalide"}"#),
            "bienId invalide"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message": ["a", "b"]}"#),
            "a; b"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "<html>"),
            "Not Found"
        );
    }
}
