//! Service layer for the "Claas Intro Source" SharePoint list.
//! - `intro_source::repository` declares the CRUD seam used by the web part.
//! - `intro_source::sharepoint` implements it over the SharePoint REST API.
//! - Errors are classified into `errors::ServiceError`.

pub mod errors;
pub mod intro_source;
