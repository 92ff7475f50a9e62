use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sharepoint: SharePointConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Site context for the list client. The list itself is fixed.
#[derive(Debug, Clone, Deserialize)]
pub struct SharePointConfig {
    /// Absolute URL of the site, e.g. `https://contoso.sharepoint.com/sites/claas`.
    #[serde(default)]
    pub site_url: String,
    /// Bearer token sent with every request when present.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self { site_url: String::new(), access_token: None, request_timeout_secs: default_request_timeout() }
    }
}

fn default_request_timeout() -> u64 { 30 }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load and validate the file at `path`. A missing file is `Ok(None)`;
    /// a file that exists but does not parse or validate is an error.
    pub fn load_if_present(path: &str) -> Result<Option<Self>> {
        if !std::path::Path::new(path).exists() {
            return Ok(None);
        }
        let mut cfg = load_from_file(path).map_err(|e| anyhow!("cannot read {path}: {e}"))?;
        cfg.normalize_and_validate().map_err(|e| anyhow!("invalid {path}: {e}"))?;
        Ok(Some(cfg))
    }

    /// Configuration built only from environment variables, for runs without a config file.
    pub fn from_env() -> Result<Self> {
        let mut server = ServerConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            server.port = port;
        }
        let mut cfg = AppConfig { server, sharepoint: SharePointConfig::default() };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.sharepoint.normalize_from_env();
        self.sharepoint.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl SharePointConfig {
    pub fn normalize_from_env(&mut self) {
        if self.site_url.trim().is_empty() {
            if let Ok(url) = std::env::var("SHAREPOINT_SITE_URL") {
                self.site_url = url;
            }
        }
        if self.access_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.access_token = std::env::var("SHAREPOINT_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty());
        }
        self.site_url = self.site_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.site_url.is_empty() {
            return Err(anyhow!("sharepoint.site_url is empty; set it in config.toml or SHAREPOINT_SITE_URL"));
        }
        let lower = self.site_url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(anyhow!("sharepoint.site_url must start with http:// or https://"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("sharepoint.request_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}
