use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Target environment of a live request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "LOCAL",
            Environment::Staging => "STAGING",
            Environment::Production => "PRODUCTION",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to perform one call
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub service_id: String,
    pub endpoint: String,
    pub method: String,
    pub environment: Environment,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Overrides the executor's default timeout
    pub timeout: Option<Duration>,
}

/// Normalized outcome of a call; transport failures land in `error`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub status_code: u16,
    pub status: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the target URL for an environment.
///
/// LOCAL goes through the reverse proxy on localhost, keyed by service id in
/// the path. STAGING and PRODUCTION use per-service subdomains.
pub fn build_url(environment: Environment, service_id: &str, endpoint: &str) -> String {
    let path = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{}", endpoint)
    };

    match environment {
        Environment::Local => format!("http://localhost/{}{}", service_id, path),
        Environment::Staging => format!("https://stg.{}.srv.whale3.io{}", service_id, path),
        Environment::Production => format!("https://{}.srv.whale3.io{}", service_id, path),
    }
}

/// Stateless HTTP proxy with a timeout
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    default_timeout: Duration,
}

impl RequestExecutor {
    pub fn new(default_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_timeout,
        })
    }

    /// Execute against the URL derived from the config's environment
    pub async fn execute(&self, config: &RequestConfig) -> ExecutionResponse {
        let url = build_url(config.environment, &config.service_id, &config.endpoint);
        self.execute_url(&url, config).await
    }

    /// Execute against an explicit URL; never fails
    pub async fn execute_url(&self, url: &str, config: &RequestConfig) -> ExecutionResponse {
        let start = Instant::now();
        let timeout = config.timeout.unwrap_or(self.default_timeout);

        let method = match Method::from_bytes(config.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return failed(format!("invalid HTTP method: {}", config.method), start);
            }
        };

        let mut request = self.client.request(method, url).timeout(timeout);
        for (key, value) in &config.headers {
            request = request.header(key, value);
        }
        if !config.body.is_empty() {
            request = request.body(config.body.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe(&e, timeout, "request failed");
                tracing::warn!(url = %url, error = %message, "Request failed");
                return failed(message, start);
            }
        };

        let mut result = head_of(&response);

        match response.text().await {
            Ok(body) => result.body = body,
            Err(e) => {
                let message = describe(&e, timeout, "failed to read response body");
                tracing::warn!(url = %url, error = %message, "Reading response body failed");
                result.error = Some(message);
            }
        }

        result.response_time_ms = elapsed_ms(start);
        result
    }
}

/// Status line and headers, as received
fn head_of(response: &Response) -> ExecutionResponse {
    let status = response.status();

    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in response.headers() {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    ExecutionResponse {
        status_code: status.as_u16(),
        status: format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
            .trim_end()
            .to_string(),
        headers,
        ..Default::default()
    }
}

fn describe(err: &reqwest::Error, timeout: Duration, context: &str) -> String {
    if err.is_timeout() {
        format!("request timed out after {}s", timeout.as_secs_f64())
    } else {
        format!("{}: {}", context, err)
    }
}

fn failed(error: String, start: Instant) -> ExecutionResponse {
    ExecutionResponse {
        error: Some(error),
        response_time_ms: elapsed_ms(start),
        ..Default::default()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
