use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Mutable columns of a list item. Serialized as-is for creation; absent optionals are omitted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IntroSourceFields {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "introSourceJV")]
    pub intro_source_jv: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer: Option<String>,
    #[serde(rename = "introSource")]
    pub intro_source: String,
    #[serde(rename = "reviewDate", default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(rename = "subArea", default, skip_serializing_if = "Option::is_none")]
    pub sub_area: Option<String>,
}

impl IntroSourceFields {
    /// Required columns must be non-blank.
    pub fn validate(&self) -> Result<(), ModelError> {
        let required = [
            ("Title", &self.title),
            ("introSourceJV", &self.intro_source_jv),
            ("introSource", &self.intro_source),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ModelError::Validation(format!("{name} is required")));
            }
        }
        Ok(())
    }
}

/// A list item as returned by the store.
///
/// `odata_type` and `etag` are only present when the item was read with
/// `odata.metadata=full`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntroSourceRecord {
    #[serde(rename = "@odata.type", default, skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
    #[serde(rename = "@odata.etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(flatten)]
    pub fields: IntroSourceFields,
}

impl IntroSourceRecord {
    /// Concurrency tag, if the record carries a usable one.
    pub fn concurrency_tag(&self) -> Option<&str> {
        self.etag.as_deref().filter(|t| !t.trim().is_empty())
    }
}
