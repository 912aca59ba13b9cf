mod common;

use common::{openapi_doc, Factory, RepoFixture, TestApp};
use postwhale::error::AppError;
use postwhale::models::{CreateHistoryEntry, CreateRepository, HttpMethod, UpsertEndpoint, UpsertService};
use postwhale::services::reconciler;
use postwhale::services::scanner::scan_repository;
use postwhale::store::{
    EndpointStore, HistoryStore, RepositoryStore, SavedRequestStore, ServiceStore, Store,
};

fn orders_repo() -> RepoFixture {
    let repo = RepoFixture::new();
    repo.add_service(
        "orders",
        "orders",
        8080,
        Some(&openapi_doc(
            "Orders API",
            &[("get", "/orders", "listOrders"), ("post", "/orders", "createOrder")],
        )),
    );
    repo.add_service(
        "users",
        "users",
        8081,
        Some(&openapi_doc("Users API", &[("get", "/users/{id}", "getUser")])),
    );
    repo
}

fn create_input(repo: &RepoFixture) -> CreateRepository {
    CreateRepository {
        name: "backend".to_string(),
        path: repo.path_str(),
    }
}

fn history_entry(endpoint_id: i64) -> CreateHistoryEntry {
    CreateHistoryEntry {
        endpoint_id,
        environment: "LOCAL".to_string(),
        headers: "{}".to_string(),
        body: String::new(),
        response: r#"{"statusCode":200}"#.to_string(),
    }
}

#[tokio::test]
async fn test_add_repository_persists_discovered_topology() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, report) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();

    assert_eq!(report.services_touched, 2);
    assert_eq!(report.endpoints_touched, 3);
    assert!(report.errors.is_empty());

    let orders = ServiceStore::find_by_key(&app.state.db, repository.id, "orders")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(orders.name, "Orders API");
    assert_eq!(orders.port, 8080);

    let create = EndpointStore::find_by_key(&app.state.db, orders.id, HttpMethod::Post, "/orders")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(create.operation_id, "createOrder");

    let spec: serde_json::Value = serde_json::from_str(&create.spec_json).unwrap();
    assert_eq!(spec["operationId"], "createOrder");
}

#[tokio::test]
async fn test_refresh_keeps_identities() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();

    let services_before = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    let mut endpoints_before = Vec::new();
    for service in &services_before {
        endpoints_before.extend(
            EndpointStore::list_by_service(&app.state.db, service.id)
                .await
                .unwrap(),
        );
    }

    let (_, report) = reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(report.services_removed, 0);
    assert_eq!(report.endpoints_removed, 0);

    let services_after = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    let mut endpoints_after = Vec::new();
    for service in &services_after {
        endpoints_after.extend(
            EndpointStore::list_by_service(&app.state.db, service.id)
                .await
                .unwrap(),
        );
    }

    let ids = |items: &[postwhale::models::Service]| items.iter().map(|s| s.id).collect::<Vec<_>>();
    assert_eq!(ids(services_before.as_slice()), ids(services_after.as_slice()));
    assert_eq!(
        endpoints_before.iter().map(|e| e.id).collect::<Vec<_>>(),
        endpoints_after.iter().map(|e| e.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_refresh_updates_changed_service_in_place() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();
    let before = ServiceStore::find_by_key(&app.state.db, repository.id, "orders")
        .await
        .unwrap()
        .unwrap();

    repo.add_service(
        "orders",
        "orders",
        9090,
        Some(&openapi_doc(
            "Orders API v2",
            &[("get", "/orders", "listOrders"), ("post", "/orders", "createOrder")],
        )),
    );
    reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap();

    let after = ServiceStore::find_by_id(&app.state.db, before.id).await.unwrap();
    assert_eq!(after.port, 9090);
    assert_eq!(after.name, "Orders API v2");
}

#[tokio::test]
async fn test_removed_service_takes_its_history_and_saved_requests() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();

    let orders = ServiceStore::find_by_key(&app.state.db, repository.id, "orders")
        .await
        .unwrap()
        .unwrap();
    let users = ServiceStore::find_by_key(&app.state.db, repository.id, "users")
        .await
        .unwrap()
        .unwrap();
    let order_endpoint = EndpointStore::list_by_service(&app.state.db, orders.id)
        .await
        .unwrap()
        .remove(0);
    let user_endpoint = EndpointStore::list_by_service(&app.state.db, users.id)
        .await
        .unwrap()
        .remove(0);

    let doomed_saved = factory.create_saved_request(order_endpoint.id, "doomed").await;
    HistoryStore::append(&app.state.db, &history_entry(order_endpoint.id))
        .await
        .unwrap();
    let kept_saved = factory.create_saved_request(user_endpoint.id, "kept").await;
    HistoryStore::append(&app.state.db, &history_entry(user_endpoint.id))
        .await
        .unwrap();

    repo.remove_service("orders");
    let (_, report) = reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(report.services_removed, 1);

    assert!(matches!(
        ServiceStore::find_by_id(&app.state.db, orders.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        EndpointStore::find_by_id(&app.state.db, order_endpoint.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        SavedRequestStore::find_by_id(&app.state.db, doomed_saved.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(HistoryStore::list_by_endpoint(&app.state.db, order_endpoint.id, 50)
        .await
        .unwrap()
        .is_empty());

    // Sibling service untouched
    assert_eq!(
        ServiceStore::find_by_id(&app.state.db, users.id).await.unwrap().id,
        users.id
    );
    assert_eq!(
        SavedRequestStore::find_by_id(&app.state.db, kept_saved.id)
            .await
            .unwrap()
            .name,
        "kept"
    );
    assert_eq!(
        HistoryStore::list_by_endpoint(&app.state.db, user_endpoint.id, 50)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_removed_endpoint_is_deleted_and_survivor_keeps_id() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();
    let orders = ServiceStore::find_by_key(&app.state.db, repository.id, "orders")
        .await
        .unwrap()
        .unwrap();
    let create = EndpointStore::find_by_key(&app.state.db, orders.id, HttpMethod::Post, "/orders")
        .await
        .unwrap()
        .unwrap();

    repo.add_service(
        "orders",
        "orders",
        8080,
        Some(&openapi_doc("Orders API", &[("post", "/orders", "createOrder")])),
    );
    let (_, report) = reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(report.endpoints_removed, 1);

    let remaining = EndpointStore::list_by_service(&app.state.db, orders.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, create.id);
}

#[tokio::test]
async fn test_failed_refresh_leaves_topology_intact() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();

    std::fs::remove_dir_all(repo.path().join("services")).unwrap();

    let err = reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Scan(_)));

    let services = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(services.len(), 2);
}

#[tokio::test]
async fn test_add_repository_rejects_duplicates_and_unscannable_roots() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();
    let err = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let bare = RepoFixture::bare();
    let err = reconciler::add_repository(&app.state.db, &create_input(&bare))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Scan(_)));
    assert!(RepositoryStore::find_by_path(&app.state.db, &bare.path_str())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_refresh_unknown_repository() {
    let app = TestApp::new().await;
    let err = reconciler::refresh_repository(&app.state.db, 404)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_duplicate_service_keys_collapse_to_one_row() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let repo = orders_repo();
    let repository = factory.create_repository(&repo.path_str()).await;

    let mut scan = scan_repository(repo.path());
    let duplicate = scan.services[0].clone();
    scan.services.push(duplicate);

    let report = reconciler::reconcile(&app.state.db, repository.id, &scan).await;
    assert!(report.errors.is_empty());

    let services = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(services.len(), 2);

    let orders: Vec<_> = services
        .iter()
        .filter(|s| s.service_key == "orders")
        .collect();
    assert_eq!(orders.len(), 1);

    let endpoints = EndpointStore::list_by_service(&app.state.db, orders[0].id)
        .await
        .unwrap();
    assert_eq!(endpoints.len(), 2);
}

#[tokio::test]
async fn test_invalid_service_does_not_stop_the_others() {
    let app = TestApp::new().await;
    let repo = RepoFixture::new();
    repo.add_service(
        "aaa",
        "aaa",
        70000,
        Some(&openapi_doc("AAA API", &[("get", "/a", "getA")])),
    );
    repo.add_service(
        "bbb",
        "bbb",
        8080,
        Some(&openapi_doc(
            "BBB API",
            &[("get", "/b", "listB"), ("post", "/b", "createB")],
        )),
    );

    let (repository, report) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();

    assert_eq!(
        report.errors,
        vec!["service aaa: port must be between 0 and 65535".to_string()]
    );
    assert_eq!(report.services_touched, 1);
    assert_eq!(report.endpoints_touched, 2);

    let services = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].service_key, "bbb");
    assert_eq!(
        EndpointStore::list_by_service(&app.state.db, services[0].id)
            .await
            .unwrap()
            .len(),
        2
    );

    // Once fixed on disk, the next refresh brings it in
    repo.add_service(
        "aaa",
        "aaa",
        8081,
        Some(&openapi_doc("AAA API", &[("get", "/a", "getA")])),
    );
    let (_, report) = reconciler::refresh_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert!(report.errors.is_empty());
    assert!(ServiceStore::find_by_key(&app.state.db, repository.id, "aaa")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_upserts_match_on_natural_key() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let repository = factory.create_repository("/srv/backend").await;

    let mut input = UpsertService {
        service_key: "orders".to_string(),
        name: "Orders".to_string(),
        port: 8080,
        directory: "orders".to_string(),
        config_json: "{}".to_string(),
    };
    let first = ServiceStore::upsert(&app.state.db, repository.id, &input)
        .await
        .unwrap();
    input.port = 8081;
    let second = ServiceStore::upsert(&app.state.db, repository.id, &input)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.port, 8081);

    let mut endpoint = UpsertEndpoint {
        method: "post".to_string(),
        path: "/orders".to_string(),
        operation_id: "createOrder".to_string(),
        spec_json: "{}".to_string(),
    };
    let first = EndpointStore::upsert(&app.state.db, second.id, &endpoint)
        .await
        .unwrap();
    endpoint.method = "POST".to_string();
    endpoint.operation_id = "placeOrder".to_string();
    let again = EndpointStore::upsert(&app.state.db, second.id, &endpoint)
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.method, "POST");
    assert_eq!(again.operation_id, "placeOrder");
    assert_eq!(
        EndpointStore::list_by_service(&app.state.db, second.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_removing_repository_removes_everything_below_it() {
    let app = TestApp::new().await;
    let repo = orders_repo();

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();
    let services = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();

    RepositoryStore::delete(&app.state.db, repository.id)
        .await
        .unwrap();

    for service in services {
        assert!(ServiceStore::find_by_id(&app.state.db, service.id).await.is_err());
        assert!(EndpointStore::list_by_service(&app.state.db, service.id)
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn test_fusion_service_end_to_end() {
    let app = TestApp::new().await;
    let repo = RepoFixture::new();
    repo.add_service(
        "fusion",
        "fusion",
        8080,
        Some(&openapi_doc("Fusion API", &[("post", "/orders", "createOrder")])),
    );

    let scan = scan_repository(repo.path());
    assert_eq!(scan.services.len(), 1);
    assert_eq!(scan.services[0].name, "Fusion API");
    assert_eq!(scan.services[0].port, 8080);

    let (repository, _) = reconciler::add_repository(&app.state.db, &create_input(&repo))
        .await
        .unwrap();
    let services = ServiceStore::list_by_repository(&app.state.db, repository.id)
        .await
        .unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].service_key, "fusion");

    let endpoints = EndpointStore::list_by_service(&app.state.db, services[0].id)
        .await
        .unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].method, "POST");
    assert_eq!(endpoints[0].path, "/orders");
    assert_eq!(endpoints[0].operation_id, "createOrder");
}
