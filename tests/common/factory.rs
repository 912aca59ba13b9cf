use std::path::{Path, PathBuf};

use tempfile::TempDir;

use postwhale::models::{
    CreateRepository, CreateSavedRequest, Endpoint, Repository, SavedRequest, Service,
    UpsertEndpoint, UpsertService,
};
use postwhale::state::AppState;
use postwhale::store::{EndpointStore, RepositoryStore, SavedRequestStore, ServiceStore};

/// A repository checkout on disk: `<root>/services/<dir>/{tw-config.json, openapi.private.yaml}`
pub struct RepoFixture {
    dir: TempDir,
}

impl RepoFixture {
    /// Empty repository with a `services` directory
    pub fn new() -> Self {
        let fixture = Self::bare();
        std::fs::create_dir(fixture.path().join("services")).unwrap();
        fixture
    }

    /// Repository root without a `services` directory
    pub fn bare() -> Self {
        // Non-hidden name so directory listings pick it up
        let dir = tempfile::Builder::new()
            .prefix("postwhale-repo-")
            .tempdir()
            .expect("Failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_str(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    pub fn service_dir(&self, dir_name: &str) -> PathBuf {
        self.dir.path().join("services").join(dir_name)
    }

    /// Service with a config and, optionally, an OpenAPI document
    pub fn add_service(&self, dir_name: &str, service_key: &str, port: i64, spec: Option<&str>) {
        let config = serde_json::json!({
            "env": { "PORT": port, "SERVICE_ID": service_key },
            "serviceId": service_key,
            "gitRepo": "git@github.com:acme/backend.git",
            "deployments": {}
        });
        self.write_file(dir_name, "tw-config.json", &config.to_string());

        if let Some(spec) = spec {
            self.write_file(dir_name, "openapi.private.yaml", spec);
        }
    }

    pub fn write_file(&self, dir_name: &str, file: &str, contents: &str) {
        let dir = self.service_dir(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), contents).unwrap();
    }

    pub fn remove_service(&self, dir_name: &str) {
        std::fs::remove_dir_all(self.service_dir(dir_name)).unwrap();
    }
}

/// Minimal OpenAPI document exposing the given (method, path, operationId) triples
pub fn openapi_doc(title: &str, operations: &[(&str, &str, &str)]) -> String {
    let mut doc = format!(
        "openapi: 3.0.0\ninfo:\n  title: {}\n  version: 1.0.0\npaths:\n",
        title
    );

    let mut paths: Vec<&str> = operations.iter().map(|(_, path, _)| *path).collect();
    paths.dedup();

    for path in paths {
        doc.push_str(&format!("  {}:\n", path));
        for (method, _, operation_id) in operations.iter().filter(|(_, p, _)| *p == path) {
            doc.push_str(&format!(
                "    {}:\n      operationId: {}\n      responses:\n        200:\n          description: OK\n",
                method.to_lowercase(),
                operation_id
            ));
        }
    }

    doc
}

/// Factory for creating store rows directly
pub struct Factory<'a> {
    state: &'a AppState,
}

impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn create_repository(&self, path: &str) -> Repository {
        let input = CreateRepository {
            name: "test-repo".to_string(),
            path: path.to_string(),
        };
        RepositoryStore::create(&self.state.db, &input).await.unwrap()
    }

    pub async fn create_service(&self, repo_id: i64, service_key: &str, port: i64) -> Service {
        let input = UpsertService {
            service_key: service_key.to_string(),
            name: format!("{} service", service_key),
            port,
            directory: service_key.to_string(),
            config_json: "{}".to_string(),
        };
        ServiceStore::create(&self.state.db, repo_id, &input)
            .await
            .unwrap()
    }

    pub async fn create_endpoint(&self, service_id: i64, method: &str, path: &str) -> Endpoint {
        let input = UpsertEndpoint {
            method: method.to_string(),
            path: path.to_string(),
            operation_id: format!("{}{}", method.to_lowercase(), path.replace('/', "_")),
            spec_json: "{}".to_string(),
        };
        EndpointStore::create(&self.state.db, service_id, &input)
            .await
            .unwrap()
    }

    pub async fn create_saved_request(&self, endpoint_id: i64, name: &str) -> SavedRequest {
        let input = CreateSavedRequest {
            endpoint_id,
            name: name.to_string(),
            path_params_json: r#"{"id":"42"}"#.to_string(),
            query_params_json: r#"[{"key":"verbose","value":"1","enabled":true}]"#.to_string(),
            headers_json: r#"[{"key":"X-Trace","value":"abc","enabled":false}]"#.to_string(),
            body: r#"{"sku":"abc"}"#.to_string(),
        };
        SavedRequestStore::create(&self.state.db, &input)
            .await
            .unwrap()
    }
}
