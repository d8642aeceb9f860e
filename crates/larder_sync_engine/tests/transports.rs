//! Transport conformance tests against mock HTTP servers.

use larder_model::{CollectionBundle, CollectionName, Credential};
use larder_store::{LocalStore, MemoryStore, SYNC_NAMESPACE};
use larder_sync_engine::{local, DriveConfig, DriveRemote, RemoteStore, RestRemote, SyncError};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credential() -> Credential {
    Credential::new("test-token", "baker@example.test")
}

fn recipe_bundle() -> CollectionBundle {
    let mut bundle = CollectionBundle::new();
    bundle.insert(CollectionName::Recipes, vec![json!({"id": "r1"})]);
    bundle
}

// ---------------------------------------------------------------------
// REST transport
// ---------------------------------------------------------------------

#[tokio::test]
async fn rest_push_sends_bearer_token_and_collections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync/push"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "collections": {"recipes": [{"id": "r1"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    remote.push(&credential(), &recipe_bundle()).await.unwrap();
}

#[tokio::test]
async fn rest_pull_returns_collections() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync/pull"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": {"recipes": [{"id": "r1", "name": "Cake"}]}
        })))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    let pulled = remote.pull(&credential()).await.unwrap().unwrap();

    assert_eq!(pulled.records(CollectionName::Recipes)[0]["name"], "Cake");
}

#[tokio::test]
async fn rest_pull_404_means_no_backup_yet() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync/pull"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    assert_eq!(remote.pull(&credential()).await.unwrap(), None);
}

#[tokio::test]
async fn rest_rejected_credential_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync/pull"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    let err = remote.pull(&credential()).await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn rest_server_failure_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync/push"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    let err = remote.push(&credential(), &recipe_bundle()).await.unwrap_err();
    assert!(matches!(err, SyncError::Transport { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn rest_undecodable_body_is_malformed_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    let err = remote.pull(&credential()).await.unwrap_err();
    assert!(matches!(err, SyncError::MalformedData(_)));
}

#[tokio::test]
async fn rest_verify_accepts_404_as_proof_of_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync/pull"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let remote = RestRemote::new(server.uri()).unwrap();
    remote.verify_credential(&credential()).await.unwrap();
}

// ---------------------------------------------------------------------
// Drive transport
// ---------------------------------------------------------------------

const FOLDER_QUERY: &str =
    "name = 'Larder' and mimeType = 'application/vnd.google-apps.folder' and trashed = false";
const DATA_FILE_QUERY: &str =
    "name = 'larder-data.json' and 'folder-1' in parents and trashed = false";
const METADATA_FILE_QUERY: &str =
    "name = 'larder-metadata.json' and 'folder-1' in parents and trashed = false";

fn drive_fixture(server: &MockServer) -> (DriveRemote, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = DriveConfig::default().with_base(server.uri());
    let remote = DriveRemote::new(config, Arc::clone(&store) as Arc<dyn LocalStore>).unwrap();
    (remote, store)
}

fn file_list(ids: &[&str]) -> serde_json::Value {
    json!({
        "files": ids
            .iter()
            .map(|id| json!({"id": id, "name": "x"}))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn drive_pull_without_folder_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", FOLDER_QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let (remote, _store) = drive_fixture(&server);
    assert_eq!(remote.pull(&credential()).await.unwrap(), None);
}

#[tokio::test]
async fn drive_pull_downloads_and_caches_resolved_ids() {
    let server = MockServer::start().await;

    // Discovery round-trips happen exactly once; the second pull runs
    // off the cached ids.
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", FOLDER_QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&["folder-1"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", DATA_FILE_QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&["file-1"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/file-1"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recipes": [{"id": "1", "name": "Cake"}],
            "orders": [],
            "customers": [],
            "ingredients": [],
            "inventory": [],
            "categories": [],
            "syncedAt": "2026-03-01T10:30:00Z",
            "version": "1.0"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (remote, store) = drive_fixture(&server);

    let pulled = remote.pull(&credential()).await.unwrap().unwrap();
    assert_eq!(pulled.records(CollectionName::Recipes)[0]["name"], "Cake");
    assert!(!pulled.contains(CollectionName::Orders));

    assert_eq!(
        store.get(SYNC_NAMESPACE, "drive_folder_id").unwrap().as_deref(),
        Some("folder-1")
    );
    assert_eq!(
        store
            .get(SYNC_NAMESPACE, "drive_data_file_id")
            .unwrap()
            .as_deref(),
        Some("file-1")
    );

    // Second pull: no further /files searches (the .expect(1) mocks
    // verify this when the server shuts down).
    remote.pull(&credential()).await.unwrap().unwrap();
}

#[tokio::test]
async fn drive_push_creates_folder_and_files_then_uploads() {
    let server = MockServer::start().await;

    for query in [FOLDER_QUERY, DATA_FILE_QUERY, METADATA_FILE_QUERY] {
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param("q", query))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&[])))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(body_partial_json(json!({
            "name": "Larder",
            "mimeType": "application/vnd.google-apps.folder"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "folder-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(body_partial_json(json!({
            "name": "larder-data.json",
            "parents": ["folder-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(body_partial_json(json!({
            "name": "larder-metadata.json",
            "parents": ["folder-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-2"})))
        .expect(1)
        .mount(&server)
        .await;

    // The uploaded envelope is whole-state and versioned; the metadata
    // file references the data file it describes.
    Mock::given(method("PATCH"))
        .and(path("/files/file-1"))
        .and(query_param("uploadType", "media"))
        .and(body_partial_json(json!({
            "recipes": [{"id": "r1"}],
            "version": "1.0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/files/file-2"))
        .and(query_param("uploadType", "media"))
        .and(body_partial_json(json!({
            "dataFileId": "file-1",
            "version": "1.0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (remote, store) = drive_fixture(&server);
    local::write_records(store.as_ref(), CollectionName::Recipes, &[json!({"id": "r1"})])
        .unwrap();

    remote.push(&credential(), &recipe_bundle()).await.unwrap();

    assert_eq!(
        store.get(SYNC_NAMESPACE, "drive_folder_id").unwrap().as_deref(),
        Some("folder-1")
    );
}

#[tokio::test]
async fn drive_verify_failure_clears_cached_connection_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (remote, store) = drive_fixture(&server);
    store.set(SYNC_NAMESPACE, "drive_folder_id", "stale-folder").unwrap();
    store.set(SYNC_NAMESPACE, "drive_data_file_id", "stale-file").unwrap();

    let err = remote.verify_credential(&credential()).await.unwrap_err();
    assert!(err.is_auth());

    assert_eq!(store.get(SYNC_NAMESPACE, "drive_folder_id").unwrap(), None);
    assert_eq!(store.get(SYNC_NAMESPACE, "drive_data_file_id").unwrap(), None);
}

#[tokio::test]
async fn drive_verify_success_keeps_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .and(query_param("fields", "user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"emailAddress": "baker@example.test"}
        })))
        .mount(&server)
        .await;

    let (remote, store) = drive_fixture(&server);
    store.set(SYNC_NAMESPACE, "drive_folder_id", "folder-1").unwrap();

    remote.verify_credential(&credential()).await.unwrap();
    assert_eq!(
        store.get(SYNC_NAMESPACE, "drive_folder_id").unwrap().as_deref(),
        Some("folder-1")
    );
}

#[tokio::test]
async fn drive_stale_cached_file_id_fails_soft_on_upload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", FOLDER_QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_list(&["folder-1"])))
        .mount(&server)
        .await;
    // The data file was deleted behind our back: the cached id 404s.
    Mock::given(method("PATCH"))
        .and(path("/files/stale-file"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (remote, store) = drive_fixture(&server);
    store.set(SYNC_NAMESPACE, "drive_data_file_id", "stale-file").unwrap();

    let err = remote.push(&credential(), &recipe_bundle()).await.unwrap_err();
    assert!(err.is_retryable());
    // The poisoned cache entry is gone; the next push re-resolves.
    assert_eq!(store.get(SYNC_NAMESPACE, "drive_data_file_id").unwrap(), None);
}
