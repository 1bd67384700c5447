//! HTTP adapter for the external mood-logging API.

use super::{MoodClient, MoodEntry, MoodError, MoodReceipt};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct HttpMoodClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpMoodClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MoodError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MoodError::Network(e.to_string()))?;

        let base_url = Url::parse(base_url.trim())
            .map_err(|e| MoodError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MoodError::InvalidUrl(base_url.to_string()));
        }
        tracing::info!("Mood API client initialized: {}", base_url);

        Ok(Self { base_url, client })
    }

    /// Appends `segments` to the base path, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, MoodError> {
        let resp = response.map_err(map_transport_error)?;
        let status = resp.status();

        if status.is_success() {
            let body = resp.text().await.map_err(map_transport_error)?;
            return serde_json::from_str(&body)
                .map_err(|e| MoodError::InvalidResponse(e.to_string()));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MoodError::Authentication,
            StatusCode::UNPROCESSABLE_ENTITY => MoodError::Rejected(body),
            _ => MoodError::Api {
                status: status.as_u16(),
                body,
            },
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> MoodError {
    if e.is_timeout() {
        MoodError::Timeout
    } else {
        MoodError::Network(e.to_string())
    }
}

#[async_trait]
impl MoodClient for HttpMoodClient {
    async fn submit(&self, entry: &MoodEntry) -> Result<MoodReceipt, MoodError> {
        tracing::info!(
            "Submitting mood {} for user {}",
            entry.emoji.label(),
            entry.user_id
        );

        let response = self
            .client
            .post(self.endpoint(&["mood", "submit"]))
            .json(entry)
            .send()
            .await;

        let receipt: MoodReceipt = Self::read_json(response).await?;
        tracing::info!(
            "Mood entry stored: id={}, weighted_mood={:.2}",
            receipt.id,
            receipt.weighted_mood
        );
        Ok(receipt)
    }

    async fn latest(&self, user_id: &str) -> Result<Option<MoodReceipt>, MoodError> {
        let response = self
            .client
            .get(self.endpoint(&["mood", user_id, "latest"]))
            .send()
            .await;

        match Self::read_json::<Option<MoodReceipt>>(response).await {
            Err(MoodError::Api { status: 404, .. }) => Ok(None),
            other => other,
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const RECEIPT: &str = r#"{"id":"m-1","user_id":"user_breathing_session","timestamp":"2024-05-01T08:30:00","emoji":"Good","emoji_score":0.5,"text":"Post-breathing exercise mood","top_emotions":[{"label":"relief","score":0.8}],"text_polarity":0.4,"weighted_mood":0.46,"z_score":0.1,"cusum":0.0,"mood_decline":false}"#;

    /// Accepts one connection, answers with `status` and `body`, and returns
    /// the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v1", listener.local_addr().unwrap());

        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, task)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    fn client(url: &str) -> HttpMoodClient {
        HttpMoodClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_submit_posts_json_body() {
        let (url, server) = serve_once("200 OK", RECEIPT).await;
        let entry = MoodEntry::new("user_breathing_session", Mood::Good)
            .with_text("Post-breathing exercise mood");

        let receipt = client(&url).submit(&entry).await.unwrap();
        assert_eq!(receipt.id, "m-1");
        assert_eq!(receipt.top_emotions[0].label, "relief");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/mood/submit HTTP/1.1"));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["user_id"], "user_breathing_session");
        assert_eq!(json["emoji"], "Good");
        assert_eq!(json["text"], "Post-breathing exercise mood");
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let (url, server) = serve_once("200 OK", RECEIPT).await;
        let client = client(&format!("{}/", url));
        client
            .submit(&MoodEntry::new("u1", Mood::Okay))
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/mood/submit "));
    }

    #[tokio::test]
    async fn test_user_id_is_one_path_segment() {
        let (url, server) = serve_once("200 OK", "null").await;
        assert!(client(&url).latest("team#7").await.unwrap().is_none());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/mood/team%237/latest HTTP/1.1"));

        let (url, server) = serve_once("200 OK", "null").await;
        client(&url).latest("a/b?c").await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/mood/a%2Fb%3Fc/latest HTTP/1.1"));
    }

    #[test]
    fn test_rejects_malformed_base_url() {
        assert!(matches!(
            HttpMoodClient::new("not a url", Duration::from_secs(1)),
            Err(MoodError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpMoodClient::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(MoodError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_error_is_rejected() {
        let (url, _server) =
            serve_once("422 Unprocessable Entity", r#"{"detail":"emoji required"}"#).await;
        let err = client(&url)
            .submit(&MoodEntry::new("u1", Mood::Down))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::Rejected(ref body) if body.contains("emoji required")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let (url, _server) = serve_once("500 Internal Server Error", "{}").await;
        let err = client(&url)
            .submit(&MoodEntry::new("u1", Mood::Down))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::Api { status: 500, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let (url, _server) = serve_once("200 OK", "not json").await;
        let err = client(&url)
            .submit(&MoodEntry::new("u1", Mood::Amazing))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_latest_handles_missing_entry() {
        let (url, server) = serve_once("404 Not Found", r#"{"detail":"not found"}"#).await;
        let latest = client(&url).latest("user_1").await.unwrap();
        assert!(latest.is_none());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/v1/mood/user_1/latest HTTP/1.1"));

        let (url, _server) = serve_once("200 OK", "null").await;
        assert!(client(&url).latest("user_1").await.unwrap().is_none());

        let (url, _server) = serve_once("200 OK", RECEIPT).await;
        let receipt = client(&url).latest("user_1").await.unwrap().unwrap();
        assert_eq!(receipt.emoji, "Good");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .submit(&MoodEntry::new("u1", Mood::Good))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::Network(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = HttpMoodClient::new(&url, Duration::from_millis(200)).unwrap();
        let err = client
            .submit(&MoodEntry::new("u1", Mood::Good))
            .await
            .unwrap_err();
        assert!(matches!(err, MoodError::Timeout));
    }
}
