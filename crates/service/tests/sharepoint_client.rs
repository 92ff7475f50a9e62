use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use configs::SharePointConfig;
use models::{IntroSourceFields, IntroSourceRecord};
use serde_json::{json, Value};
use service::errors::ServiceError;
use service::intro_source::{IntroSourceRepository, SharePointListClient};
use tokio::net::TcpListener;

const SITE_PATH: &str = "/sites/claas";
const LIST_PATH: &str = "/_api/web/lists/getbytitle('Claas Intro Source')";
const ENTITY_TYPE: &str = "SP.Data.Claas_x0020_Intro_x0020_SourceListItem";

#[derive(Clone, Debug)]
struct Seen {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: String,
}

/// Stand-in for the list endpoint: keeps items with etags and records every request.
#[derive(Default)]
struct StubList {
    items: Mutex<Vec<Value>>,
    seen: Mutex<Vec<Seen>>,
    canned: Mutex<Option<(StatusCode, String)>>,
}

impl StubList {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn respond_with(&self, status: StatusCode, body: &str) {
        *self.canned.lock().unwrap() = Some((status, body.to_string()));
    }
}

fn decode(path: &str) -> String {
    path.replace("%20", " ").replace("%27", "'")
}

fn project(item: &Value, full: bool) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(obj) = item.as_object() {
        for (k, v) in obj {
            if k.starts_with("@odata.") && !full {
                continue;
            }
            out.insert(k.clone(), v.clone());
        }
    }
    if full {
        out.insert("@odata.type".into(), json!(format!("#{ENTITY_TYPE}")));
    }
    Value::Object(out)
}

fn sp_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "odata.error": { "message": { "value": message } } }))).into_response()
}

async fn handle(
    State(stub): State<Arc<StubList>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = decode(uri.path());
    stub.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        headers: headers.clone(),
        body: body.clone(),
    });

    if let Some((status, canned)) = stub.canned.lock().unwrap().clone() {
        return (status, canned).into_response();
    }

    let Some(rest) = path.strip_prefix(&format!("{SITE_PATH}{LIST_PATH}")) else {
        return sp_error(StatusCode::NOT_FOUND, "List does not exist.");
    };
    let full = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.contains("odata.metadata=full"));
    let mut items = stub.items.lock().unwrap();

    match (method.as_str(), rest) {
        ("GET", "") => Json(json!({ "ListItemEntityTypeFullName": ENTITY_TYPE })).into_response(),
        ("GET", "/items") => {
            let mut sorted: Vec<Value> = items.clone();
            sorted.sort_by_key(|v| v["Id"].as_i64().unwrap_or_default());
            if query.get("$orderby").map(String::as_str) == Some("Id desc") {
                sorted.reverse();
            }
            if let Some(top) = query.get("$top").and_then(|t| t.parse::<usize>().ok()) {
                sorted.truncate(top);
            }
            let value: Vec<Value> = sorted.iter().map(|v| project(v, full)).collect();
            Json(json!({ "value": value })).into_response()
        }
        ("POST", "/items") => {
            let Ok(mut created) = serde_json::from_str::<Value>(&body) else {
                return sp_error(StatusCode::BAD_REQUEST, "Invalid JSON.");
            };
            if created["@odata.type"] != json!(ENTITY_TYPE) {
                return sp_error(StatusCode::BAD_REQUEST, "Entity type mismatch.");
            }
            let id = items.iter().filter_map(|v| v["Id"].as_i64()).max().unwrap_or(0) + 1;
            if let Some(obj) = created.as_object_mut() {
                obj.remove("@odata.type");
                obj.insert("Id".into(), json!(id));
                obj.insert("@odata.etag".into(), json!("\"1\""));
            }
            items.push(created.clone());
            (StatusCode::CREATED, Json(project(&created, false))).into_response()
        }
        (m, item) if item.starts_with("/items(") && item.ends_with(')') => {
            let Ok(id) = item["/items(".len()..item.len() - 1].parse::<i64>() else {
                return sp_error(StatusCode::BAD_REQUEST, "Bad id.");
            };
            let Some(pos) = items.iter().position(|v| v["Id"].as_i64() == Some(id)) else {
                return sp_error(StatusCode::NOT_FOUND, "Item does not exist.");
            };
            if m == "GET" {
                return Json(project(&items[pos], full)).into_response();
            }
            let if_match = headers.get("if-match").and_then(|v| v.to_str().ok()).unwrap_or_default();
            if items[pos]["@odata.etag"].as_str() != Some(if_match) {
                return sp_error(StatusCode::PRECONDITION_FAILED, "The request ETag value does not match.");
            }
            match headers.get("x-http-method").and_then(|v| v.to_str().ok()) {
                Some("MERGE") => {
                    let patch: Value = serde_json::from_str(&body).unwrap_or_default();
                    let version = items[pos]["@odata.etag"]
                        .as_str()
                        .and_then(|e| e.trim_matches('"').parse::<u64>().ok())
                        .unwrap_or(1);
                    if let (Some(target), Some(patch)) = (items[pos].as_object_mut(), patch.as_object()) {
                        for (k, v) in patch {
                            if !k.starts_with("@odata.") {
                                target.insert(k.clone(), v.clone());
                            }
                        }
                        target.insert("@odata.etag".into(), json!(format!("\"{}\"", version + 1)));
                    }
                    StatusCode::NO_CONTENT.into_response()
                }
                Some("DELETE") => {
                    items.remove(pos);
                    StatusCode::OK.into_response()
                }
                _ => sp_error(StatusCode::METHOD_NOT_ALLOWED, "Unsupported."),
            }
        }
        _ => sp_error(StatusCode::NOT_FOUND, "Not found."),
    }
}

fn item(id: i64, etag: &str, title: &str) -> Value {
    let dealer = if id % 2 == 0 { Value::Null } else { json!(format!("{title} dealer")) };
    json!({
        "@odata.etag": etag,
        "Id": id,
        "Title": title,
        "introSource": format!("{title} source"),
        "introSourceJV": "Leasing Solutions",
        "dealer": dealer,
        "subArea": "North",
        "reviewDate": "2024-03-01T00:00:00Z"
    })
}

async fn start_stub(items: Vec<Value>) -> anyhow::Result<(String, Arc<StubList>)> {
    let stub = Arc::new(StubList { items: Mutex::new(items), ..StubList::default() });
    let app = Router::new().fallback(handle).with_state(Arc::clone(&stub));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("stub error: {}", e); }
    });
    Ok((format!("http://{}:{}{}/", addr.ip(), addr.port(), SITE_PATH), stub))
}

fn client(site_url: &str) -> SharePointListClient {
    SharePointListClient::new(reqwest::Client::new(), site_url)
}

fn demo_fields() -> IntroSourceFields {
    IntroSourceFields {
        title: "Robs Intro Source".into(),
        intro_source_jv: "Leasing Solutions".into(),
        dealer: Some("Robs Dealer".into()),
        intro_source: "Robs Intro Source".into(),
        review_date: None,
        sub_area: Some("Robs Sub Area".into()),
    }
}

#[tokio::test]
async fn list_all_returns_every_item_unchanged() -> anyhow::Result<()> {
    let seeded = vec![item(1, "\"1\"", "a"), item(2, "\"1\"", "b"), item(3, "\"4\"", "c")];
    let (site, stub) = start_stub(seeded.clone()).await?;

    let records = client(&site).list_all().await?;
    assert_eq!(records.len(), 3);
    for (record, raw) in records.iter().zip(&seeded) {
        let expected: IntroSourceRecord = serde_json::from_value(project(raw, false))?;
        assert_eq!(record, &expected);
        assert_eq!(record.etag, None);
    }
    assert_eq!(records[1].fields.dealer, None);
    assert_eq!(records[0].fields.dealer.as_deref(), Some("a dealer"));

    let seen = stub.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].path, format!("{SITE_PATH}{LIST_PATH}/items"));
    assert_eq!(seen[0].query["$select"], "Id,Title,introSource,introSourceJV,dealer,subArea,reviewDate");
    assert_eq!(seen[0].headers["accept"], "application/json; odata.metadata=none");
    Ok(())
}

#[tokio::test]
async fn get_last_picks_the_highest_id() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(3, "\"1\"", "a"), item(57, "\"2\"", "b"), item(12, "\"1\"", "c")]).await?;

    let last = client(&site).get_last().await?.expect("list is not empty");
    assert_eq!(last.id, 57);
    assert_eq!(last.concurrency_tag(), Some("\"2\""));
    assert_eq!(last.odata_type.as_deref(), Some("#SP.Data.Claas_x0020_Intro_x0020_SourceListItem"));

    let seen = stub.seen();
    assert_eq!(seen[0].query["$orderby"], "Id desc");
    assert_eq!(seen[0].query["$top"], "1");
    assert_eq!(seen[0].headers["accept"], "application/json; odata.metadata=full");
    Ok(())
}

#[tokio::test]
async fn get_last_on_empty_list_is_none() -> anyhow::Result<()> {
    let (site, _stub) = start_stub(Vec::new()).await?;
    assert!(client(&site).get_last().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn get_by_id_finds_item_or_reports_not_found() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(3, "\"1\"", "a"), item(57, "\"2\"", "b")]).await?;
    let c = client(&site);

    let found = c.get_by_id(57).await?;
    assert_eq!(found.id, 57);
    assert_eq!(found.fields.title, "b");
    assert_eq!(found.concurrency_tag(), Some("\"2\""));

    let missing = c.get_by_id(999).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))), "got {missing:?}");

    let seen = stub.seen();
    assert_eq!(seen[0].path, format!("{SITE_PATH}{LIST_PATH}/items(57)"));
    assert_eq!(seen[0].query["$select"], "Id,Title,introSource,introSourceJV,dealer,subArea,reviewDate");
    Ok(())
}

#[tokio::test]
async fn get_by_id_rejects_non_positive_ids_locally() -> anyhow::Result<()> {
    let (site, stub) = start_stub(Vec::new()).await?;
    assert!(matches!(client(&site).get_by_id(0).await, Err(ServiceError::Validation(_))));
    assert!(stub.seen().is_empty());
    Ok(())
}

#[tokio::test]
async fn create_looks_up_entity_type_then_posts() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(3, "\"1\"", "a")]).await?;
    let c = client(&site);

    c.create(&demo_fields()).await?;

    let seen = stub.seen();
    assert_eq!(seen.len(), 2, "exactly one lookup and one create");
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].path, format!("{SITE_PATH}{LIST_PATH}"));
    assert_eq!(seen[0].query["$select"], "ListItemEntityTypeFullName");

    assert_eq!(seen[1].method, Method::POST);
    assert_eq!(seen[1].path, format!("{SITE_PATH}{LIST_PATH}/items"));
    assert_eq!(seen[1].headers["content-type"], "application/json");
    assert_eq!(seen[1].headers["accept"], "application/json; odata.metadata=none");
    let payload: Value = serde_json::from_str(&seen[1].body)?;
    assert_eq!(payload["@odata.type"], ENTITY_TYPE);
    assert_eq!(payload["Title"], "Robs Intro Source");
    assert!(payload.get("Id").is_none());

    let last = c.get_last().await?.expect("created item");
    assert_eq!(last.id, 4);
    assert_eq!(last.fields, demo_fields());
    Ok(())
}

#[tokio::test]
async fn every_create_repeats_the_lookup() -> anyhow::Result<()> {
    let (site, stub) = start_stub(Vec::new()).await?;
    let c = client(&site);
    c.create(&demo_fields()).await?;
    c.create(&demo_fields()).await?;
    let lookups = stub.seen().iter().filter(|s| s.query.contains_key("$select") && s.method == Method::GET).count();
    assert_eq!(lookups, 2);
    Ok(())
}

#[tokio::test]
async fn create_with_blank_required_field_sends_nothing() -> anyhow::Result<()> {
    let (site, stub) = start_stub(Vec::new()).await?;
    let mut fields = demo_fields();
    fields.title = String::new();
    assert!(matches!(client(&site).create(&fields).await, Err(ServiceError::Model(_))));
    assert!(stub.seen().is_empty());
    Ok(())
}

#[tokio::test]
async fn update_sends_if_match_and_stale_tag_conflicts() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(5, "etag-1", "a")]).await?;
    let c = client(&site);

    let mut record = c.get_by_id(5).await?;
    assert_eq!(record.concurrency_tag(), Some("etag-1"));
    record.fields.review_date = Some("2025-01-02T03:04:05.000Z".into());
    c.update(&record).await?;

    let seen = stub.seen();
    let merge = &seen[1];
    assert_eq!(merge.method, Method::POST);
    assert_eq!(merge.path, format!("{SITE_PATH}{LIST_PATH}/items(5)"));
    assert_eq!(merge.headers["if-match"], "etag-1");
    assert_eq!(merge.headers["x-http-method"], "MERGE");
    let body: Value = serde_json::from_str(&merge.body)?;
    assert_eq!(body["reviewDate"], "2025-01-02T03:04:05.000Z");
    assert!(body.get("Id").is_none());
    assert!(body.get("@odata.etag").is_none());

    let stale = c.update(&record).await;
    assert!(matches!(stale, Err(ServiceError::Conflict(_))), "got {stale:?}");

    let fresh = c.get_by_id(5).await?;
    assert_eq!(fresh.fields.review_date.as_deref(), Some("2025-01-02T03:04:05.000Z"));
    Ok(())
}

#[tokio::test]
async fn update_clears_optional_columns_set_to_none() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(5, "\"1\"", "a")]).await?;
    let c = client(&site);

    let mut record = c.get_by_id(5).await?;
    assert_eq!(record.fields.dealer.as_deref(), Some("a dealer"));
    record.fields.dealer = None;
    record.fields.sub_area = None;
    c.update(&record).await?;

    let body: Value = serde_json::from_str(&stub.seen()[1].body)?;
    assert_eq!(body["dealer"], Value::Null);
    assert!(body.as_object().is_some_and(|o| o.contains_key("dealer") && o.contains_key("subArea")));

    let fresh = c.get_by_id(5).await?;
    assert_eq!(fresh.fields.dealer, None);
    assert_eq!(fresh.fields.sub_area, None);
    assert_eq!(fresh.fields.title, "a");
    Ok(())
}

#[tokio::test]
async fn conflict_status_on_merge_or_delete_is_a_conflict() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(5, "\"1\"", "a")]).await?;
    let c = client(&site);
    let record = c.get_by_id(5).await?;

    stub.respond_with(StatusCode::CONFLICT, "save conflict");
    let update = c.update(&record).await;
    assert!(matches!(update, Err(ServiceError::Conflict(_))), "got {update:?}");
    let delete = c.delete(&record).await;
    assert!(matches!(delete, Err(ServiceError::Conflict(_))), "got {delete:?}");
    Ok(())
}

#[tokio::test]
async fn mutations_without_tag_are_rejected_before_sending() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(5, "\"1\"", "a")]).await?;
    let c = client(&site);
    let untagged = c.list_all().await?.remove(0);
    assert!(matches!(c.update(&untagged).await, Err(ServiceError::Validation(_))));
    assert!(matches!(c.delete(&untagged).await, Err(ServiceError::Validation(_))));
    assert_eq!(stub.seen().len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_removes_item_and_stale_tag_conflicts() -> anyhow::Result<()> {
    let (site, stub) = start_stub(vec![item(5, "\"1\"", "a"), item(6, "\"1\"", "b")]).await?;
    let c = client(&site);

    let mut stale = c.get_by_id(6).await?;
    stale.etag = Some("\"0\"".into());
    assert!(matches!(c.delete(&stale).await, Err(ServiceError::Conflict(_))));

    let last = c.get_last().await?.expect("item 6");
    c.delete(&last).await?;
    let delete = stub.seen().into_iter().last().expect("delete request");
    assert_eq!(delete.headers["x-http-method"], "DELETE");
    assert_eq!(delete.headers["if-match"], "\"1\"");

    let remaining = c.list_all().await?;
    assert_eq!(remaining.iter().map(|r| r.id).collect::<Vec<_>>(), vec![5]);
    Ok(())
}

#[tokio::test]
async fn malformed_or_failed_responses_are_transport_errors() -> anyhow::Result<()> {
    let (site, stub) = start_stub(Vec::new()).await?;
    let c = client(&site);

    stub.respond_with(StatusCode::OK, "<html>not json</html>");
    assert!(matches!(c.list_all().await, Err(ServiceError::Transport(_))));

    stub.respond_with(StatusCode::OK, r#"{"value":[{"Id":1,"Title":"t"}]}"#);
    assert!(matches!(c.list_all().await, Err(ServiceError::Transport(_))));

    stub.respond_with(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    assert!(matches!(c.list_all().await, Err(ServiceError::Transport(_))));
    assert!(matches!(c.get_by_id(1).await, Err(ServiceError::Transport(_))));
    assert!(matches!(c.create(&demo_fields()).await, Err(ServiceError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn unreachable_site_is_a_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let c = client(&format!("http://{}:{}", addr.ip(), addr.port()));
    assert!(matches!(c.list_all().await, Err(ServiceError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn configured_client_sends_bearer_token() -> anyhow::Result<()> {
    let (site, stub) = start_stub(Vec::new()).await?;
    let cfg = SharePointConfig { site_url: site, access_token: Some("secret-token".into()), request_timeout_secs: 5 };
    let c = SharePointListClient::from_config(&cfg)?;
    c.list_all().await?;
    assert_eq!(stub.seen()[0].headers["authorization"], "Bearer secret-token");
    Ok(())
}
