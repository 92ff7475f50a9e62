//! Response envelopes returned by the SharePoint REST endpoints.

use serde::{Deserialize, Serialize};

use crate::intro_source::{IntroSourceFields, IntroSourceRecord};

/// `{"value": [...]}` wrapper of an item query.
#[derive(Debug, Deserialize)]
pub struct ODataCollection<T> {
    pub value: Vec<T>,
}

/// Result of `getbytitle(...)?$select=ListItemEntityTypeFullName`.
#[derive(Debug, Deserialize)]
pub struct ListEntityType {
    #[serde(rename = "ListItemEntityTypeFullName")]
    pub full_name: String,
}

/// Body of an item creation request: the columns stamped with the list's type marker.
#[derive(Debug, Serialize)]
pub struct CreateItemPayload<'a> {
    #[serde(rename = "@odata.type")]
    pub odata_type: &'a str,
    #[serde(flatten)]
    pub fields: &'a IntroSourceFields,
}

/// Body of a MERGE. Id and etag travel in the URL and headers, not here.
///
/// Every column is written; an absent optional goes out as `null` and clears the stored value.
#[derive(Debug, Serialize)]
pub struct MergeItemPayload<'a> {
    #[serde(rename = "@odata.type", skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<&'a str>,
    #[serde(rename = "Title")]
    pub title: &'a str,
    #[serde(rename = "introSourceJV")]
    pub intro_source_jv: &'a str,
    pub dealer: Option<&'a str>,
    #[serde(rename = "introSource")]
    pub intro_source: &'a str,
    #[serde(rename = "reviewDate")]
    pub review_date: Option<&'a str>,
    #[serde(rename = "subArea")]
    pub sub_area: Option<&'a str>,
}

impl<'a> From<&'a IntroSourceRecord> for MergeItemPayload<'a> {
    fn from(record: &'a IntroSourceRecord) -> Self {
        let f = &record.fields;
        Self {
            odata_type: record.odata_type.as_deref(),
            title: &f.title,
            intro_source_jv: &f.intro_source_jv,
            dealer: f.dealer.as_deref(),
            intro_source: &f.intro_source,
            review_date: f.review_date.as_deref(),
            sub_area: f.sub_area.as_deref(),
        }
    }
}
