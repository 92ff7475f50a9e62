use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, IF_MATCH};

use crate::errors::ServiceError;

/// Title of the backing list. All operations target this list only.
pub const LIST_TITLE: &str = "Claas Intro Source";

/// Field projection used by every item read.
pub const SELECT_FIELDS: &str = "Id,Title,introSource,introSourceJV,dealer,subArea,reviewDate";

const ORDER_LAST: &str = "&$orderby=Id desc&$top=1";

const ACCEPT_NO_METADATA: &str = "application/json; odata.metadata=none";
const ACCEPT_FULL_METADATA: &str = "application/json; odata.metadata=full";
const JSON: &str = "application/json";

const X_HTTP_METHOD: &str = "x-http-method";

/// URL builder for the fixed list on a given site.
#[derive(Clone, Debug)]
pub struct ListEndpoint {
    list_url: String,
}

impl ListEndpoint {
    pub fn new(site_url: &str) -> Self {
        let site = site_url.trim_end_matches('/');
        Self { list_url: format!("{site}/_api/web/lists/getbytitle('{LIST_TITLE}')") }
    }

    /// All items, projected.
    pub fn items(&self) -> String {
        format!("{}/items?$select={SELECT_FIELDS}", self.list_url)
    }

    /// The item with the highest Id.
    pub fn last_item(&self) -> String {
        format!("{}{ORDER_LAST}", self.items())
    }

    /// One item by id, projected.
    pub fn item(&self, id: i64) -> String {
        format!("{}?$select={SELECT_FIELDS}", self.item_target(id))
    }

    /// POST target for MERGE/DELETE of one item.
    pub fn item_target(&self, id: i64) -> String {
        format!("{}/items({id})", self.list_url)
    }

    /// POST target for item creation.
    pub fn create_target(&self) -> String {
        format!("{}/items", self.list_url)
    }

    pub fn entity_type(&self) -> String {
        format!("{}?$select=ListItemEntityTypeFullName", self.list_url)
    }
}

/// Shape of one outgoing request. Headers are derived per request and never shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind<'a> {
    ReadNoMetadata,
    ReadFullMetadata,
    Create,
    Update { etag: &'a str },
    Delete { etag: &'a str },
}

impl RequestKind<'_> {
    pub fn headers(&self) -> Result<HeaderMap, ServiceError> {
        let mut headers = HeaderMap::new();
        match *self {
            RequestKind::ReadNoMetadata => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_NO_METADATA));
            }
            RequestKind::ReadFullMetadata => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FULL_METADATA));
            }
            RequestKind::Create => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_NO_METADATA));
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
            }
            RequestKind::Update { etag } => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_NO_METADATA));
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
                headers.insert(HeaderName::from_static(X_HTTP_METHOD), HeaderValue::from_static("MERGE"));
                headers.insert(IF_MATCH, etag_value(etag)?);
            }
            RequestKind::Delete { etag } => {
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_NO_METADATA));
                headers.insert(HeaderName::from_static(X_HTTP_METHOD), HeaderValue::from_static("DELETE"));
                headers.insert(IF_MATCH, etag_value(etag)?);
            }
        }
        Ok(headers)
    }
}

fn etag_value(etag: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(etag)
        .map_err(|_| ServiceError::Validation(format!("concurrency tag {etag:?} is not a valid header value")))
}
