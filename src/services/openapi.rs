use std::collections::BTreeMap;
use std::path::Path;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::HttpMethod;

/// File name of the per-service API description
pub const OPENAPI_FILE: &str = "openapi.private.yaml";

/// The OpenAPI 3 subset read from a service's spec file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenApiSpec {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    #[serde(deserialize_with = "string_keyed")]
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Server {
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Components {
    #[serde(deserialize_with = "string_keyed")]
    pub schemas: BTreeMap<String, Schema>,
}

/// Operations declared under one path
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub patch: Option<Operation>,
    pub delete: Option<Operation>,
    pub head: Option<Operation>,
    pub options: Option<Operation>,
    /// Shared by every operation under the path
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    fn operations(&self) -> [(HttpMethod, Option<&Operation>); 7] {
        [
            (HttpMethod::Get, self.get.as_ref()),
            (HttpMethod::Post, self.post.as_ref()),
            (HttpMethod::Put, self.put.as_ref()),
            (HttpMethod::Patch, self.patch.as_ref()),
            (HttpMethod::Delete, self.delete.as_ref()),
            (HttpMethod::Head, self.head.as_ref()),
            (HttpMethod::Options, self.options.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    #[serde(deserialize_with = "string_keyed")]
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String, // path, query, header
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    pub required: bool,
    #[serde(deserialize_with = "string_keyed")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaType {
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub description: String,
    #[serde(deserialize_with = "string_keyed")]
    pub content: BTreeMap<String, MediaType>,
}

/// JSON schema subset; nests through `properties` and `items`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(
        deserialize_with = "string_keyed",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    #[serde(rename = "$ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

/// One (method, path) operation, flattened out of a spec document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

impl ApiEndpoint {
    /// JSON kept as the endpoint's spec blob
    pub fn to_blob(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl OpenApiSpec {
    /// Read and decode a spec file
    pub fn parse_file(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode a spec document from raw bytes
    pub fn parse(bytes: &[u8]) -> AppResult<Self> {
        let spec: Option<Self> = serde_yaml::from_slice(bytes)
            .map_err(|e| AppError::Serialization(format!("invalid OpenAPI document: {}", e)))?;

        // An empty document is valid YAML with nothing in it
        Ok(spec.unwrap_or_default())
    }

    /// Every (path, method) pair that carries an operation, ordered by path
    /// then method
    pub fn extract_endpoints(&self) -> Vec<ApiEndpoint> {
        let mut endpoints = Vec::new();

        for (path, item) in &self.paths {
            for (method, operation) in item.operations() {
                let Some(operation) = operation else {
                    continue;
                };

                endpoints.push(ApiEndpoint {
                    operation_id: operation.operation_id.clone(),
                    method,
                    path: path.clone(),
                    summary: operation.summary.clone(),
                    tags: operation.tags.clone(),
                    parameters: merge_parameters(&item.parameters, &operation.parameters),
                    request_body: operation.request_body.clone(),
                    responses: operation.responses.clone(),
                });
            }
        }

        endpoints
    }
}

/// Path-level parameters, overridden by operation-level ones with the same
/// (name, location)
fn merge_parameters(shared: &[Parameter], own: &[Parameter]) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = shared
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(own.iter().cloned());
    merged
}

/// YAML maps whose keys may be unquoted numbers (`200:`) or booleans
fn string_keyed<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();

    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => return Err(D::Error::custom(format!("unsupported map key: {:?}", other))),
            };
            let value = serde_yaml::from_value(value).map_err(D::Error::custom)?;
            Ok((key, value))
        })
        .collect()
}
