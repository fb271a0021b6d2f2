//! Integration tests for the feed lifecycle: first page, next page, stale
//! suppression, failures and save-for-later.
//!
//! Each test runs a wiremock Qiita server and its own in-memory SQLite
//! database, and drives `FeedController` the way the UI loop does.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qiita_pocket::api::QiitaClient;
use qiita_pocket::feed::{
    FeedController, FetchCompletion, ListUpdate, SearchHistoryStore, SettingsStore,
};
use qiita_pocket::storage::Database;

type Controller = FeedController<QiitaClient, Database>;

fn item(n: usize) -> Value {
    json!({
        "id": format!("item{n:03}"),
        "title": format!("Swift tip #{n}"),
        "url": format!("https://qiita.com/dev/items/item{n:03}"),
        "likes_count": n,
        "created_at": "2024-06-01T09:00:00+09:00",
        "tags": [{"name": "Swift", "versions": []}],
        "user": {"id": "dev", "name": "Dev"}
    })
}

fn page(range: std::ops::Range<usize>) -> Value {
    Value::Array(range.map(item).collect())
}

async fn mount_page(server: &MockServer, tag: &str, page_no: u32, body: Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .and(query_param("page", page_no.to_string()))
        .and(query_param("query", format!("tag:{tag}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}

async fn setup(server: &MockServer) -> (Controller, mpsc::Receiver<FetchCompletion>) {
    let db = Database::open(":memory:").await.unwrap();
    let client = QiitaClient::new(
        reqwest::Client::new(),
        &server.uri(),
        None,
        20,
        Duration::from_secs(5),
    )
    .unwrap();
    let (tx, rx) = mpsc::channel(8);
    (FeedController::new(Arc::new(client), db, tx), rx)
}

async fn next_update(
    controller: &mut Controller,
    rx: &mut mpsc::Receiver<FetchCompletion>,
) -> ListUpdate {
    let completion = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("fetch did not complete")
        .expect("channel closed");
    controller.handle_completion(completion)
}

#[tokio::test]
async fn test_swift_scenario_end_to_end() {
    let server = MockServer::start().await;
    mount_page(&server, "swift", 1, page(0..20), Duration::ZERO).await;
    mount_page(&server, "swift", 2, page(20..35), Duration::ZERO).await;

    let (mut controller, mut rx) = setup(&server).await;

    controller.search("swift").await.unwrap();
    assert!(controller.is_loading());

    assert_eq!(next_update(&mut controller, &mut rx).await, ListUpdate::Reload);
    assert_eq!(controller.articles().len(), 20);
    assert_eq!(controller.next_page(), Some(2));
    assert!(!controller.is_loading());

    assert!(controller.load_next_page());
    assert_eq!(
        next_update(&mut controller, &mut rx).await,
        ListUpdate::Insert(20..35)
    );
    assert_eq!(controller.articles().len(), 35);
    assert_eq!(controller.next_page(), Some(3));

    let removed = controller.articles()[5].clone();
    assert_eq!(controller.save_for_later(5).await, ListUpdate::Remove(5));
    assert_eq!(controller.articles().len(), 34);

    let saved = controller.store().list_read_later().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].article, removed);

    assert_eq!(
        controller.store().current_tag().await.unwrap(),
        Some("swift".to_string())
    );
    assert_eq!(controller.store().search_history().await.unwrap(), vec!["swift"]);
}

#[tokio::test]
async fn test_stale_query_never_reaches_the_list() {
    let server = MockServer::start().await;
    mount_page(&server, "slow", 1, page(100..110), Duration::from_millis(300)).await;
    mount_page(&server, "fast", 1, page(0..3), Duration::ZERO).await;

    let (mut controller, mut rx) = setup(&server).await;

    controller.search("slow").await.unwrap();
    controller.search("fast").await.unwrap();

    assert_eq!(next_update(&mut controller, &mut rx).await, ListUpdate::Reload);
    assert_eq!(controller.articles().len(), 3);
    assert_eq!(controller.articles()[0].id, "item000");

    // The slow request was aborted; nothing else arrives.
    let late = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(late.is_err());
    assert_eq!(controller.articles().len(), 3);
}

#[tokio::test]
async fn test_next_page_ignored_while_first_page_loads() {
    let server = MockServer::start().await;
    mount_page(&server, "rust", 1, page(0..20), Duration::from_millis(100)).await;

    let (mut controller, mut rx) = setup(&server).await;
    controller.search("rust").await.unwrap();

    assert!(!controller.load_next_page());
    next_update(&mut controller, &mut rx).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_server_error_raises_single_alert() {
    let server = MockServer::start().await;
    mount_page(&server, "go", 1, page(0..20), Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = setup(&server).await;
    controller.search("go").await.unwrap();
    next_update(&mut controller, &mut rx).await;

    assert!(controller.load_next_page());
    assert_eq!(next_update(&mut controller, &mut rx).await, ListUpdate::None);

    let alert = controller.alert().unwrap();
    assert!(alert.starts_with("Failed to load articles"));
    assert!(alert.contains("500"));
    assert_eq!(controller.articles().len(), 20);
    assert_eq!(controller.next_page(), Some(2));
}

#[tokio::test]
async fn test_empty_result_shows_empty_state() {
    let server = MockServer::start().await;
    mount_page(&server, "nothing", 1, json!([]), Duration::ZERO).await;

    let (mut controller, mut rx) = setup(&server).await;
    assert!(!controller.show_empty());

    controller.search("nothing").await.unwrap();
    next_update(&mut controller, &mut rx).await;

    assert!(controller.articles().is_empty());
    assert!(controller.show_empty());
}

#[tokio::test]
async fn test_refresh_reuses_stored_settings() {
    let server = MockServer::start().await;
    mount_page(&server, "kotlin", 1, page(0..4), Duration::ZERO).await;

    let (mut controller, mut rx) = setup(&server).await;
    controller.store().set_current_tag("kotlin").await.unwrap();

    controller.refresh().await.unwrap();
    assert_eq!(next_update(&mut controller, &mut rx).await, ListUpdate::Reload);
    assert_eq!(controller.articles().len(), 4);
    assert!(controller.store().search_history().await.unwrap().is_empty());
}
