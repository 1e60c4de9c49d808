//! The board REST collaborator.
//!
//! [`BoardApi`] is the seam the reconciler talks through; [`HttpBoardClient`]
//! implements it over reqwest against:
//!
//! - `GET   {base}/api/boards/{board}/columns`
//! - `GET   {base}/api/boards/{board}/issues`
//! - `PATCH {base}/api/issues/{issue}/move`
//! - `POST  {base}/api/boards/{board}/issues`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{ApiErrorBody, Column, CreateIssueRequest, MoveIssueRequest, WorkItem};
use crate::config::StratflowConfig;
use crate::errors::{ApiError, RejectReason};

#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Columns of a board, ordered by position.
    async fn fetch_columns(&self, board_id: &str) -> Result<Vec<Column>, ApiError>;

    /// Every issue on a board.
    async fn fetch_issues(&self, board_id: &str) -> Result<Vec<WorkItem>, ApiError>;

    /// Move one issue to an absolute position.
    async fn move_issue(&self, request: &MoveIssueRequest) -> Result<WorkItem, ApiError>;

    /// Create an issue at the end of a column.
    async fn create_issue(
        &self,
        board_id: &str,
        request: &CreateIssueRequest,
    ) -> Result<WorkItem, ApiError>;
}

pub struct HttpBoardClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBoardClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &StratflowConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url(), config.api_token(), config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T, ApiError> {
        let resp = builder.send().await.map_err(ApiError::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            debug!(status = status.as_u16(), context, "board API returned error status");
            return Err(rejection(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            context: context.to_string(),
            source,
        })
    }
}

/// Turn a non-2xx response into `ApiError::Rejected`, reading the
/// `{error, code}` body when the server sent one.
fn rejection(status: u16, body: &str) -> ApiError {
    let (message, code) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.error, parsed.code),
        Err(_) if body.trim().is_empty() => (format!("HTTP {}", status), None),
        Err(_) => (body.trim().to_string(), None),
    };
    ApiError::Rejected {
        status,
        reason: RejectReason::from_code(code.as_deref(), status),
        message,
    }
}

#[async_trait]
impl BoardApi for HttpBoardClient {
    async fn fetch_columns(&self, board_id: &str) -> Result<Vec<Column>, ApiError> {
        let url = self.endpoint(&["api", "boards", board_id, "columns"])?;
        let mut columns: Vec<Column> = self
            .send(self.request(Method::GET, url), "board columns")
            .await?;
        columns.sort_by_key(|c| c.position);
        Ok(columns)
    }

    async fn fetch_issues(&self, board_id: &str) -> Result<Vec<WorkItem>, ApiError> {
        let url = self.endpoint(&["api", "boards", board_id, "issues"])?;
        self.send(self.request(Method::GET, url), "board issues").await
    }

    async fn move_issue(&self, request: &MoveIssueRequest) -> Result<WorkItem, ApiError> {
        let url = self.endpoint(&["api", "issues", request.issue_id.as_str(), "move"])?;
        self.send(self.request(Method::PATCH, url).json(request), "moved issue")
            .await
    }

    async fn create_issue(
        &self,
        board_id: &str,
        request: &CreateIssueRequest,
    ) -> Result<WorkItem, ApiError> {
        let url = self.endpoint(&["api", "boards", board_id, "issues"])?;
        self.send(self.request(Method::POST, url).json(request), "created issue")
            .await
    }
}
