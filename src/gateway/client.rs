use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use tokio::time::Instant;

use crate::error::{AppError, AppResult, GatewayError, ValidationError};

use super::types::CommandSpec;
use super::wire::ExecuteRequest;
use super::{EXECUTE_ENDPOINT, HEALTH_ENDPOINT, STATUS_ENDPOINT};

/// Longest response excerpt kept in an error message.
const ERROR_BODY_EXCERPT: usize = 512;

/// Raw request/response calls against the gateway. Implementations return
/// the response body of a successful call; parsing lives with the callers.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the gateway cannot be reached or answers with a
    /// non-success status.
    async fn health(&self) -> Result<Vec<u8>, GatewayError>;

    /// # Errors
    ///
    /// Returns an error when the gateway cannot be reached or answers with a
    /// non-success status.
    async fn execute(&self, spec: &CommandSpec) -> Result<Vec<u8>, GatewayError>;

    /// # Errors
    ///
    /// Returns an error when the gateway cannot be reached or answers with a
    /// non-success status.
    async fn task_status(&self, task_id: &str) -> Result<Vec<u8>, GatewayError>;
}

/// HTTP/JSON binding: `GET /health`, `POST /v1/execute`, `GET /v1/tasks/{id}`.
#[derive(Debug, Clone)]
pub struct HttpGatewayTransport {
    client: Client,
    health_url: Url,
    execute_url: Url,
    tasks_url: Url,
}

impl HttpGatewayTransport {
    /// Builds a transport rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let mut base = Url::parse(base_url).map_err(|err| {
            AppError::validation(ValidationError::InvalidUrl {
                url: base_url.to_owned(),
                source: err,
            })
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation(ValidationError::UnsupportedUrl {
                url: base_url.to_owned(),
            }));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let join = |path: &str| {
            base.join(path).map_err(|err| {
                AppError::validation(ValidationError::InvalidUrl {
                    url: format!("{}{}", base, path),
                    source: err,
                })
            })
        };
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            health_url: join("health")?,
            execute_url: join("v1/execute")?,
            tasks_url: join("v1/tasks/")?,
        })
    }

    fn task_url(&self, task_id: &str) -> Url {
        let mut url = self.tasks_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(task_id);
        }
        url
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, GatewayError> {
        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint,
                elapsed: started.elapsed(),
                source,
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint,
                elapsed: started.elapsed(),
                source,
            })?;
        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                elapsed: started.elapsed(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(ERROR_BODY_EXCERPT)
                    .collect(),
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl GatewayTransport for HttpGatewayTransport {
    async fn health(&self) -> Result<Vec<u8>, GatewayError> {
        let request = self.client.get(self.health_url.clone());
        self.send(HEALTH_ENDPOINT, request).await
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<Vec<u8>, GatewayError> {
        let request = self
            .client
            .post(self.execute_url.clone())
            .json(&ExecuteRequest::from(spec));
        self.send(EXECUTE_ENDPOINT, request).await
    }

    async fn task_status(&self, task_id: &str) -> Result<Vec<u8>, GatewayError> {
        let request = self.client.get(self.task_url(task_id));
        self.send(STATUS_ENDPOINT, request).await
    }
}
