use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// The fixed set of HTTP methods an endpoint may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(AppError::Validation(format!("invalid HTTP method: {}", s))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation exposed by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: i64,
    pub service_id: i64,
    pub method: String,  // always one of HttpMethod, upper case
    pub path: String,
    pub operation_id: String,
    pub spec_json: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Endpoint {
    /// (method, path) natural key within the owning service
    pub fn natural_key(&self) -> (String, String) {
        (self.method.clone(), self.path.clone())
    }
}

/// Input for both plain creation and upsert-by-natural-key
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertEndpoint {
    pub method: String,
    pub path: String,
    pub operation_id: String,
    pub spec_json: String,
}

impl UpsertEndpoint {
    /// Validate and return the normalised method
    pub fn validate(&self) -> AppResult<HttpMethod> {
        if self.method.is_empty() {
            return Err(AppError::Validation(
                "endpoint method cannot be empty".to_string(),
            ));
        }
        if self.path.is_empty() {
            return Err(AppError::Validation(
                "endpoint path cannot be empty".to_string(),
            ));
        }
        self.method.parse()
    }
}
