//! Wire and domain types for the "Claas Intro Source" SharePoint list.

pub mod errors;
pub mod intro_source;
pub mod odata;

pub use intro_source::{IntroSourceFields, IntroSourceRecord};
