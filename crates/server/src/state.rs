use std::sync::Arc;

use service::intro_source::IntroSourceRepository;
use tokio::sync::RwLock;

use crate::render::render_table;

/// Shared web part state: the list repository and the single render target.
///
/// The render target is overwritten wholesale by every completed action;
/// when actions overlap, the last one to finish wins.
#[derive(Clone)]
pub struct WebPartState {
    pub repo: Arc<dyn IntroSourceRepository>,
    output: Arc<RwLock<String>>,
}

impl WebPartState {
    pub fn new(repo: Arc<dyn IntroSourceRepository>) -> Self {
        Self { repo, output: Arc::new(RwLock::new(String::new())) }
    }

    pub async fn current_table(&self) -> String {
        self.output.read().await.clone()
    }

    pub async fn show(&self, table: String) {
        *self.output.write().await = table;
    }

    /// Clear the output to a header-only table.
    pub async fn show_headers_only(&self) {
        self.show(render_table(None)).await;
    }
}
