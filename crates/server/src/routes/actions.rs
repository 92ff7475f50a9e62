use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use models::IntroSourceFields;
use tracing::info;

use crate::errors::PageError;
use crate::render::{render_page, render_table};
use crate::state::WebPartState;

/// Item fetched by the "Get Claas Intro Source" button.
pub const DEMO_ITEM_ID: i64 = 57;

/// Record submitted by the "Create Claas Intro Source" button.
pub fn demo_record() -> IntroSourceFields {
    IntroSourceFields {
        title: "Robs Intro Source".into(),
        intro_source_jv: "Leasing Solutions".into(),
        dealer: Some("Robs Dealer".into()),
        intro_source: "Robs Intro Source".into(),
        review_date: None,
        sub_area: Some("Robs Sub Area".into()),
    }
}

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn review_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Store a freshly rendered table and answer with the page, or keep the old table and show the error.
async fn finish(state: &WebPartState, action: &str, outcome: Result<String, PageError>) -> Response {
    match outcome {
        Ok(table) => {
            state.show(table.clone()).await;
            Html(render_page(&table, None)).into_response()
        }
        Err(e) => {
            let table = state.current_table().await;
            e.into_page(action, &table)
        }
    }
}

async fn render_all(state: &WebPartState) -> Result<String, PageError> {
    let records = state.repo.list_all().await?;
    Ok(render_table(Some(records.as_slice())))
}

pub async fn index(State(state): State<WebPartState>) -> Html<String> {
    let table = state.current_table().await;
    Html(render_page(&table, None))
}

pub async fn list_all(State(state): State<WebPartState>) -> Response {
    let outcome = render_all(&state).await;
    finish(&state, "list-all", outcome).await
}

pub async fn get_one(State(state): State<WebPartState>) -> Response {
    let outcome = fetch_demo_item(&state).await;
    finish(&state, "get-one", outcome).await
}

pub async fn get_last(State(state): State<WebPartState>) -> Response {
    let outcome = fetch_last(&state).await;
    finish(&state, "get-last", outcome).await
}

pub async fn create(State(state): State<WebPartState>) -> Response {
    state.show_headers_only().await;
    let outcome = create_demo(&state).await;
    finish(&state, "create", outcome).await
}

pub async fn update_last(State(state): State<WebPartState>) -> Response {
    let outcome = stamp_last(&state).await;
    finish(&state, "update-last", outcome).await
}

pub async fn delete_last(State(state): State<WebPartState>) -> Response {
    let outcome = remove_last(&state).await;
    finish(&state, "delete-last", outcome).await
}

async fn fetch_demo_item(state: &WebPartState) -> Result<String, PageError> {
    let record = state.repo.get_by_id(DEMO_ITEM_ID).await?;
    Ok(render_table(Some(std::slice::from_ref(&record))))
}

async fn fetch_last(state: &WebPartState) -> Result<String, PageError> {
    let last = state.repo.get_last().await?;
    Ok(render_table(Some(last.as_slice())))
}

async fn create_demo(state: &WebPartState) -> Result<String, PageError> {
    let record = demo_record();
    state.repo.create(&record).await?;
    info!(title = %record.title, "demo record created");
    render_all(state).await
}

async fn stamp_last(state: &WebPartState) -> Result<String, PageError> {
    let mut record = state.repo.get_last().await?.ok_or_else(PageError::empty_list)?;
    record.fields.review_date = Some(review_timestamp());
    state.repo.update(&record).await?;
    info!(id = record.id, "last record review date stamped");
    render_all(state).await
}

async fn remove_last(state: &WebPartState) -> Result<String, PageError> {
    let record = state.repo.get_last().await?.ok_or_else(PageError::empty_list)?;
    state.repo.delete(&record).await?;
    info!(id = record.id, "last record deleted");
    render_all(state).await
}
