//! HTTP client backend talking to a running annopy server

use async_trait::async_trait;
use serde::Deserialize;

use super::store::{AnnotationBackend, BackendError, Notice};
use super::types::{Annotation, AnnotationFeed, AnnotationForm};

/// Header carrying the acting user's id
pub const USER_HEADER: &str = "X-User-Id";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Backend reaching the annotation endpoints over HTTP
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Turn a write response into a notice or the server's refusal
    async fn notice(response: reqwest::Response) -> Result<Notice, BackendError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<Notice>()
                .await
                .map_err(|e| BackendError::Transport(format!("Failed to parse response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            Err(BackendError::Rejected(message))
        } else {
            Err(BackendError::Transport(format!(
                "Server returned {}: {}",
                status, body
            )))
        }
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

#[async_trait]
impl AnnotationBackend for RemoteBackend {
    async fn fetch_annotations(
        &self,
        submission: u64,
        author: Option<u64>,
    ) -> Result<Vec<Annotation>, BackendError> {
        let mut request = self
            .client
            .get(self.url(&format!("/submissions/{}/annotations", submission)));
        if let Some(author) = author {
            request = request.query(&[("userid", author)]);
        }

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(BackendError::Transport(format!(
                "Server returned {}",
                response.status()
            )));
        }

        let feed: AnnotationFeed = response.json().await.map_err(transport)?;
        Ok(feed.into_vec())
    }

    async fn submit(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError> {
        let response = self
            .client
            .post(self.url(&format!("/submissions/{}/annotations", form.submission)))
            .header(USER_HEADER, user.to_string())
            .json(form)
            .send()
            .await
            .map_err(transport)?;
        Self::notice(response).await
    }

    async fn delete(&self, user: u64, annotation: u64) -> Result<Notice, BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/annotations/{}", annotation)))
            .header(USER_HEADER, user.to_string())
            .send()
            .await
            .map_err(transport)?;
        Self::notice(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let backend = RemoteBackend::new("http://localhost:3000/");
        assert_eq!(
            backend.url("/annotations/4"),
            "http://localhost:3000/api/v1/annotations/4"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let backend = RemoteBackend::new("http://127.0.0.1:9");
        let result = backend.fetch_annotations(1, None).await;
        assert!(matches!(result, Err(BackendError::Transport(_))));
    }
}
