//! REST client for the remote poll store.
//!
//! ```text
//! GET    {base}/polls?status=..&category=..   → [Poll]
//! GET    {base}/polls/{id}                    → Poll
//! GET    {base}/polls/{id}/results            → Stats
//! DELETE {base}/polls/{id}                    → ack
//! ```

use async_trait::async_trait;
use reqwest::{header, Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::PollStore;
use crate::error::SyncError;
use crate::poll::{Poll, PollFilters, Stats};

pub struct HttpPollStore {
    base_url: String,
    api_token: Option<String>,
    http_client: HttpClient,
}

impl HttpPollStore {
    pub fn new(base_url: &str, api_token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            http_client: HttpClient::new(),
        }
    }

    fn polls_url(&self) -> String {
        format!("{}/polls", self.base_url)
    }

    fn poll_url(&self, id: &str) -> String {
        format!("{}/polls/{}", self.base_url, id)
    }

    fn results_url(&self, id: &str) -> String {
        format!("{}/polls/{}/results", self.base_url, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_token {
            Some(ref token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder, id: Option<&str>) -> Result<T, SyncError> {
        let resp = self.authorize(request).send().await.map_err(SyncError::remote)?;
        let resp = check_status(resp, id)?;
        resp.json::<T>().await.map_err(SyncError::remote)
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn status_error(status: StatusCode, id: Option<&str>) -> SyncError {
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => SyncError::NotFound(id.to_string()),
        _ => SyncError::RemoteUnavailable(format!("HTTP {}", status)),
    }
}

fn check_status(resp: Response, id: Option<&str>) -> Result<Response, SyncError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(resp.status(), id))
    }
}

#[async_trait]
impl PollStore for HttpPollStore {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn list(&self, filters: &PollFilters) -> Result<Vec<Poll>, SyncError> {
        let request = self
            .http_client
            .get(self.polls_url())
            .query(&filters.query_pairs());
        self.fetch_json(request, None).await
    }

    async fn get(&self, id: &str) -> Result<Poll, SyncError> {
        let request = self.http_client.get(self.poll_url(id));
        self.fetch_json(request, Some(id)).await
    }

    async fn results(&self, id: &str) -> Result<Stats, SyncError> {
        let request = self.http_client.get(self.results_url(id));
        self.fetch_json(request, Some(id)).await
    }

    async fn remove(&self, id: &str) -> Result<(), SyncError> {
        let request = self.authorize(self.http_client.delete(self.poll_url(id)));
        let failed = |reason: String| SyncError::DeleteFailed {
            id: id.to_string(),
            reason,
        };
        match request.send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(failed(format!("HTTP {}", resp.status()))),
            Err(e) => Err(failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let store = HttpPollStore::new("https://polls.example.org/api/", None);
        assert_eq!(store.polls_url(), "https://polls.example.org/api/polls");
        assert_eq!(store.poll_url("42"), "https://polls.example.org/api/polls/42");
        assert_eq!(
            store.results_url("42"),
            "https://polls.example.org/api/polls/42/results"
        );
    }

    #[test]
    fn test_not_found_maps_only_for_single_poll() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, Some("7")),
            SyncError::NotFound("7".to_string())
        );
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, None),
            SyncError::RemoteUnavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, Some("7")),
            SyncError::RemoteUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_remote_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let store = HttpPollStore::new("http://127.0.0.1:9", None);
        let err = store.list(&PollFilters::default()).await.unwrap_err();
        assert!(matches!(err, SyncError::RemoteUnavailable(_)));

        let err = store.remove("1").await.unwrap_err();
        assert!(matches!(err, SyncError::DeleteFailed { .. }));
    }
}
