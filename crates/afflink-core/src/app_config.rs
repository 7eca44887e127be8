use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Marketplace host used when building canonical and affiliate links,
    /// e.g. `"www.amazon.es"`.
    pub marketplace_domain: String,
    pub affiliate_tag: Option<String>,
    /// Credential pool for the scraping service, in rotation order.
    pub scraper_api_keys: Vec<String>,
    pub scraper_endpoint: String,
    pub scraper_key_param: String,
    pub scraper_url_param: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Whether a network-level failure moves on to the next credential
    /// instead of aborting the rotation pass.
    pub rotate_on_network_error: bool,
    /// Public proxy URL templates for the fan-out fetch path.
    pub proxy_endpoints: Vec<String>,
    pub proxy_attempt_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("marketplace_domain", &self.marketplace_domain)
            .field("affiliate_tag", &self.affiliate_tag)
            .field(
                "scraper_api_keys",
                &format_args!("[{} redacted]", self.scraper_api_keys.len()),
            )
            .field("scraper_endpoint", &self.scraper_endpoint)
            .field("scraper_key_param", &self.scraper_key_param)
            .field("scraper_url_param", &self.scraper_url_param)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("rotate_on_network_error", &self.rotate_on_network_error)
            .field("proxy_endpoints", &self.proxy_endpoints)
            .field(
                "proxy_attempt_timeout_secs",
                &self.proxy_attempt_timeout_secs,
            )
            .finish()
    }
}
