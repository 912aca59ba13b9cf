use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// File name of the per-service config document
pub const SERVICE_CONFIG_FILE: &str = "tw-config.json";

/// Per-service config document (`tw-config.json`)
///
/// Only the shape is checked: missing fields take their empty value, a field
/// of the wrong type fails the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub env: ServiceEnv,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "gitRepo")]
    pub git_repo: String,
    pub deployments: BTreeMap<String, Deployment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEnv {
    #[serde(rename = "PORT")]
    pub port: i64,
    #[serde(rename = "SERVICE_ID")]
    pub service_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub name: String,
    pub endpoints: BTreeMap<String, DeploymentEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentEndpoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl ServiceConfig {
    /// Read and decode a config file
    pub fn parse_file(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode a config document from raw bytes
    pub fn parse(bytes: &[u8]) -> AppResult<Self> {
        let invalid = |msg: String| AppError::Serialization(format!("invalid service config: {}", msg));

        let value: Value = serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
        check_objects(&value).map_err(invalid)?;
        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
    }

    /// Compact JSON kept as the service's config blob
    pub fn to_blob(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Derived struct deserializers also take sequences, filling fields by
/// position. Only JSON objects are valid wherever a struct or map is expected.
fn check_objects(root: &Value) -> Result<(), String> {
    let root = expect_object(root, "document")?;

    if let Some(env) = root.get("env") {
        expect_object(env, "env")?;
    }

    if let Some(deployments) = root.get("deployments") {
        for (name, deployment) in expect_object(deployments, "deployments")? {
            let deployment = expect_object(deployment, &format!("deployments.{}", name))?;
            let Some(endpoints) = deployment.get("endpoints") else {
                continue;
            };
            let endpoints = expect_object(endpoints, &format!("deployments.{}.endpoints", name))?;
            for (key, endpoint) in endpoints {
                expect_object(endpoint, &format!("deployments.{}.endpoints.{}", name, key))?;
            }
        }
    }

    Ok(())
}

fn expect_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{} must be a JSON object", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUSION: &str = r#"{
        "env": {"PORT": 8080, "SERVICE_ID": "fusion"},
        "serviceId": "fusion",
        "gitRepo": "git@github.com:acme/backend.git",
        "deployments": {
            "prod": {
                "name": "fusion-prod",
                "endpoints": {
                    "api": {"type": "http", "url": "https://fusion.internal", "cluster": "east"}
                }
            }
        },
        "color": "blue"
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config = ServiceConfig::parse(FUSION.as_bytes()).unwrap();

        assert_eq!(config.service_id, "fusion");
        assert_eq!(config.env.port, 8080);
        assert_eq!(config.env.service_id, "fusion");
        assert_eq!(config.color.as_deref(), Some("blue"));
        assert!(config.runtime.is_none());

        let endpoint = &config.deployments["prod"].endpoints["api"];
        assert_eq!(endpoint.kind, "http");
        assert_eq!(endpoint.cluster.as_deref(), Some("east"));
    }

    #[test]
    fn test_missing_fields_default() {
        let config = ServiceConfig::parse(br#"{"serviceId": "bare"}"#).unwrap();
        assert_eq!(config.env.port, 0);
        assert!(config.deployments.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(ServiceConfig::parse(br#"{"env": {"PORT": "8080"}}"#).is_err());
        assert!(ServiceConfig::parse(b"{ not json").is_err());
        assert!(ServiceConfig::parse(b"[]").is_err());
    }

    #[test]
    fn test_positional_arrays_are_rejected() {
        assert!(ServiceConfig::parse(br#"[{"PORT": 9000}, "sneaky"]"#).is_err());
        assert!(ServiceConfig::parse(br#"{"serviceId": "a", "env": [9000, "a"]}"#).is_err());
        assert!(ServiceConfig::parse(br#"{"serviceId": "a", "deployments": {"prod": ["x", {}]}}"#).is_err());
        assert!(ServiceConfig::parse(
            br#"{"serviceId": "a", "deployments": {"prod": {"endpoints": {"api": ["http", "u"]}}}}"#
        )
        .is_err());

        let err = ServiceConfig::parse(b"[]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "serialization error: invalid service config: document must be a JSON object"
        );
    }

    #[test]
    fn test_blob_keeps_wire_names() {
        let config = ServiceConfig::parse(FUSION.as_bytes()).unwrap();
        let blob = config.to_blob().unwrap();
        assert!(blob.contains("\"serviceId\":\"fusion\""));
        assert!(blob.contains("\"PORT\":8080"));
        assert_eq!(ServiceConfig::parse(blob.as_bytes()).unwrap(), config);
    }
}
