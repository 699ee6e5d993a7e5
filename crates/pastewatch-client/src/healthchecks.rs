use std::time::Duration;

use pastewatch_core::error::AppError;
use pastewatch_core::traits::HealthReporter;
use reqwest::{Client, Method};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Health reporter speaking the healthchecks.io ping protocol.
///
/// `HEAD {url}/start` opens a run, `HEAD {url}` closes it successfully and
/// `POST {url}/fail` closes it as failed with the message as body.
#[derive(Clone)]
pub struct HealthchecksClient {
    client: Client,
    ping_url: String,
}

impl HealthchecksClient {
    pub fn new(ping_url: &str) -> Result<Self, AppError> {
        Self::with_timeout(ping_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(ping_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Url::parse(ping_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid healthcheck URL '{ping_url}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HealthCheckError(e.to_string()))?;

        Ok(Self {
            client,
            ping_url: ping_url.trim_end_matches('/').to_string(),
        })
    }

    async fn ping(&self, method: Method, suffix: &str, body: Option<&str>) -> Result<(), AppError> {
        let url = format!("{}{}", self.ping_url, suffix);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::HealthCheckError(format!("Ping {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HealthCheckError(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

impl HealthReporter for HealthchecksClient {
    async fn report_start(&self) -> Result<(), AppError> {
        self.ping(Method::HEAD, "/start", None).await
    }

    async fn report_success(&self) -> Result<(), AppError> {
        self.ping(Method::HEAD, "", None).await
    }

    async fn report_failure(&self, message: &str) -> Result<(), AppError> {
        self.ping(Method::POST, "/fail", Some(message)).await
    }
}
