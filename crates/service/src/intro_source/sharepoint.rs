use std::time::Duration;

use async_trait::async_trait;
use configs::SharePointConfig;
use models::odata::{CreateItemPayload, ListEntityType, MergeItemPayload, ODataCollection};
use models::{IntroSourceFields, IntroSourceRecord};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::repository::{require_positive_id, require_tag, IntroSourceRepository};
use super::request::{ListEndpoint, RequestKind};
use crate::errors::ServiceError;

/// REST client for the "Claas Intro Source" list of one site.
#[derive(Clone, Debug)]
pub struct SharePointListClient {
    http: Client,
    endpoint: ListEndpoint,
}

/// Which failures a response may be classified as besides `Transport`.
#[derive(Clone, Copy)]
enum Scope {
    List,
    Item(i64),
}

impl SharePointListClient {
    pub fn new(http: Client, site_url: &str) -> Self {
        Self { http, endpoint: ListEndpoint::new(site_url) }
    }

    /// Build the HTTP client from site configuration (timeout, optional bearer token).
    pub fn from_config(cfg: &SharePointConfig) -> Result<Self, ServiceError> {
        let mut defaults = HeaderMap::new();
        if let Some(token) = cfg.access_token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ServiceError::Validation("access token is not a valid header value".into()))?;
            value.set_sensitive(true);
            defaults.insert(AUTHORIZATION, value);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .default_headers(defaults)
            .build()?;
        Ok(Self::new(http, &cfg.site_url))
    }

    /// Resolve the entity type name the list requires on item creation.
    #[instrument(skip(self))]
    pub async fn item_entity_type(&self) -> Result<String, ServiceError> {
        let meta: ListEntityType =
            self.get_json(&self.endpoint.entity_type(), RequestKind::ReadNoMetadata, Scope::List).await?;
        debug!(entity_type = %meta.full_name, "resolved list item entity type");
        Ok(meta.full_name)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, kind: RequestKind<'_>, scope: Scope) -> Result<T, ServiceError> {
        let resp = self.http.get(url).headers(kind.headers()?).send().await?;
        let resp = check_status(resp, scope).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Transport(format!("malformed response from {url}: {e}")))
    }

    async fn post(&self, url: &str, kind: RequestKind<'_>, body: Option<Vec<u8>>, scope: Scope) -> Result<(), ServiceError> {
        let mut req = self.http.post(url).headers(kind.headers()?);
        if let Some(body) = body {
            req = req.body(body);
        }
        let resp = req.send().await?;
        check_status(resp, scope).await?;
        Ok(())
    }
}

/// Map a non-success response onto the error taxonomy.
async fn check_status(resp: Response, scope: Scope) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = body.chars().take(512).collect::<String>();
    match (scope, status) {
        (Scope::Item(id), StatusCode::NOT_FOUND) => Err(ServiceError::NotFound(format!("intro source {id} not found"))),
        (Scope::Item(id), StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT) => {
            warn!(id, %status, "store rejected concurrency tag");
            Err(ServiceError::Conflict(format!("intro source {id} was modified by someone else ({status})")))
        }
        _ => Err(ServiceError::Transport(format!("HTTP {status}: {detail}"))),
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(value).map_err(|e| ServiceError::Transport(format!("cannot serialize request body: {e}")))
}

#[async_trait]
impl IntroSourceRepository for SharePointListClient {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<IntroSourceRecord>, ServiceError> {
        let page: ODataCollection<IntroSourceRecord> =
            self.get_json(&self.endpoint.items(), RequestKind::ReadNoMetadata, Scope::List).await?;
        info!(count = page.value.len(), "listed intro sources");
        Ok(page.value)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<IntroSourceRecord, ServiceError> {
        require_positive_id(id)?;
        let record: IntroSourceRecord =
            self.get_json(&self.endpoint.item(id), RequestKind::ReadFullMetadata, Scope::Item(id)).await?;
        info!(id = record.id, "fetched intro source");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get_last(&self) -> Result<Option<IntroSourceRecord>, ServiceError> {
        let page: ODataCollection<IntroSourceRecord> =
            self.get_json(&self.endpoint.last_item(), RequestKind::ReadFullMetadata, Scope::List).await?;
        let last = page.value.into_iter().next();
        match &last {
            Some(record) => info!(id = record.id, "fetched last intro source"),
            None => info!("intro source list is empty"),
        }
        Ok(last)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create(&self, input: &IntroSourceFields) -> Result<(), ServiceError> {
        input.validate()?;
        let entity_type = self.item_entity_type().await?;
        let body = to_body(&CreateItemPayload { odata_type: &entity_type, fields: input })?;
        self.post(&self.endpoint.create_target(), RequestKind::Create, Some(body), Scope::List).await?;
        info!(entity_type = %entity_type, "created intro source");
        Ok(())
    }

    #[instrument(skip(self, record), fields(id = record.id))]
    async fn update(&self, record: &IntroSourceRecord) -> Result<(), ServiceError> {
        let etag = require_tag(record)?;
        let body = to_body(&MergeItemPayload::from(record))?;
        self.post(&self.endpoint.item_target(record.id), RequestKind::Update { etag }, Some(body), Scope::Item(record.id))
            .await?;
        info!(etag, "updated intro source");
        Ok(())
    }

    #[instrument(skip(self, record), fields(id = record.id))]
    async fn delete(&self, record: &IntroSourceRecord) -> Result<(), ServiceError> {
        let etag = require_tag(record)?;
        self.post(&self.endpoint.item_target(record.id), RequestKind::Delete { etag }, None, Scope::Item(record.id))
            .await?;
        info!(etag, "deleted intro source");
        Ok(())
    }
}
