//! Intro source list module: request building, repository seam, SharePoint client.

pub mod repository;
pub mod request;
pub mod sharepoint;

pub use repository::IntroSourceRepository;
pub use sharepoint::SharePointListClient;
