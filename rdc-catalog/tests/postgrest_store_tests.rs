//! PostgREST binding against a local stub server

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::any;
use axum::Router;
use rdc_catalog::store::{Filter, Order, PostgrestStore, RemoteStore, Row, StoreErrorKind};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const KEY: &str = "anon-test-key";

#[derive(Debug, Clone)]
struct SeenRequest {
    method: Method,
    path: String,
    query: String,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: String,
}

/// Replies with a fixed status and body, recording every request
#[derive(Clone)]
struct Stub {
    reply: Arc<Mutex<(u16, String)>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl Stub {
    fn last(&self) -> SeenRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn handle(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    stub.seen.lock().unwrap().push(SeenRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        apikey: header(&headers, "apikey"),
        authorization: header(&headers, "authorization"),
        prefer: header(&headers, "prefer"),
        body,
    });

    let (status, body) = stub.reply.lock().unwrap().clone();
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}

async fn start_stub(status: u16, body: Value) -> (PostgrestStore, Stub) {
    start_stub_text(status, body.to_string()).await
}

async fn start_stub_text(status: u16, body: String) -> (PostgrestStore, Stub) {
    let stub = Stub {
        reply: Arc::new(Mutex::new((status, body))),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/rest/v1/:table", any(handle))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let store =
        PostgrestStore::new(&format!("http://{}/", addr), KEY, Duration::from_secs(5)).unwrap();
    (store, stub)
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_select_sends_key_and_order() {
    let (store, stub) = start_stub(200, json!([{ "id": 2, "nome": "B" }, { "id": 1, "nome": "A" }])).await;

    let rows = store
        .select("clinicas", &[], Some(&Order::desc("id")))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["nome"], json!("B"));

    let seen = stub.last();
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.path, "/rest/v1/clinicas");
    assert_eq!(seen.query, "select=*&order=id.desc");
    assert_eq!(seen.apikey.as_deref(), Some(KEY));
    assert_eq!(seen.authorization, Some(format!("Bearer {}", KEY)));
}

#[tokio::test]
async fn test_insert_asks_for_representation() {
    let (store, stub) = start_stub(201, json!([{ "id": 41, "nome": "Nova" }])).await;

    let inserted = store
        .insert("clinicas", vec![row(json!({ "nome": "Nova", "fotos": ["a.jpg"] }))])
        .await
        .unwrap();

    assert_eq!(inserted[0]["id"], json!(41));

    let seen = stub.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.prefer.as_deref(), Some("return=representation"));
    let body: Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body, json!([{ "nome": "Nova", "fotos": ["a.jpg"] }]));
}

#[tokio::test]
async fn test_update_filters_by_id() {
    let (store, stub) = start_stub(200, json!([{ "id": 7, "preco": 99.9 }])).await;

    let affected = store
        .update(
            "clinicas",
            row(json!({ "preco": 99.9 })),
            &[Filter::eq("id", "7")],
        )
        .await
        .unwrap();

    assert_eq!(affected.len(), 1);
    let seen = stub.last();
    assert_eq!(seen.method, Method::PATCH);
    assert_eq!(seen.query, "id=eq.7");
    assert_eq!(seen.prefer.as_deref(), Some("return=representation"));
}

#[tokio::test]
async fn test_delete_with_empty_body() {
    let (store, stub) = start_stub_text(204, String::new()).await;

    store
        .delete("clinicas", &[Filter::eq("id", "3")])
        .await
        .unwrap();

    let seen = stub.last();
    assert_eq!(seen.method, Method::DELETE);
    assert_eq!(seen.query, "id=eq.3");
}

#[tokio::test]
async fn test_schema_cache_miss_is_missing_column() {
    let (store, _stub) = start_stub(
        400,
        json!({
            "code": "PGRST204",
            "details": null,
            "hint": null,
            "message": "Could not find the 'fotos' column of 'clinicas' in the schema cache"
        }),
    )
    .await;

    let err = store
        .insert("clinicas", vec![row(json!({ "fotos": [] }))])
        .await
        .unwrap_err();

    assert!(err.is_missing_column("fotos"));
    assert!(!err.is_missing_column("preco"));
}

#[tokio::test]
async fn test_permission_denied_is_rejected() {
    let (store, _stub) = start_stub(
        403,
        json!({ "code": "42501", "message": "permission denied for table clinicas" }),
    )
    .await;

    let err = store
        .delete("clinicas", &[Filter::eq("id", "1")])
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        StoreErrorKind::Rejected {
            status: 403,
            code: Some("42501".to_string())
        }
    );
    assert!(err.message.contains("permission denied"));
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store =
        PostgrestStore::new(&format!("http://{}", addr), KEY, Duration::from_secs(2)).unwrap();
    let err = store.select("clinicas", &[], None).await.unwrap_err();

    assert_eq!(err.kind, StoreErrorKind::Unavailable);
}
