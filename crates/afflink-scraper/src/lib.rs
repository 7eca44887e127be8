pub mod attempt;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod provider;
pub mod proxy;
pub mod rotation;
pub mod scraper;

pub use attempt::{AttemptOutcome, FetchAttempt};
pub use credentials::{CredentialPool, RotationState};
pub use error::ScraperError;
pub use extract::{extract_page_asin, extract_product};
pub use provider::{ProviderPayload, UpstreamEndpoint};
pub use proxy::ProxyFanout;
pub use rotation::{NetworkErrorPolicy, RotatingFetcher};
pub use scraper::ProductScraper;
