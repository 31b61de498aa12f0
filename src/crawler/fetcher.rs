//! Page fetching for the thread scraper

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, instrument};

use crate::crawler::ScraperConfig;
use crate::crawler::error::CrawlError;

/// Build the URL for a 1-based page of a thread.
///
/// Page 1 is the thread URL itself; later pages append `page-N` verbatim, so
/// the thread URL is expected to end with `/`.
pub fn page_url(thread_url: &str, page: u32) -> String {
    if page <= 1 {
        return thread_url.to_string();
    }
    format!("{}page-{}", thread_url, page)
}

/// Fetches raw thread pages over HTTP. Never retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    thread_url: String,
}

impl Fetcher {
    /// Create a fetcher that sends the configured headers with every request
    pub fn new(config: &ScraperConfig) -> Result<Self, CrawlError> {
        url::Url::parse(&config.thread_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| CrawlError::Other(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept)
                .map_err(|e| CrawlError::Other(format!("Invalid accept header: {}", e)))?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            thread_url: config.thread_url.clone(),
        })
    }

    /// URL of the thread being fetched
    pub fn thread_url(&self) -> &str {
        &self.thread_url
    }

    /// Fetch one page and return its HTML
    #[instrument(skip(self))]
    pub async fn fetch(&self, page: u32) -> Result<String, CrawlError> {
        let url = page_url(&self.thread_url, page);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
