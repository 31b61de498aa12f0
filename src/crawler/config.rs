//! # Scraper Configuration Module
//!
//! Configuration for a thread scrape: which thread, which pages, how politely
//! to fetch them and where in the markup the post fields live. Uses a builder
//! so the CLI and tests only spell out what they change.
//!
//! ## Key Components
//!
//! - `ScraperConfig`: The thread URL, page range, throttle and request headers
//! - `PostSelectors`: CSS selectors for the post container and its fields
//! - `ScraperConfigBuilder`: Builder pattern implementation
//!
//! The selector defaults match XenForo thread markup.

use std::time::Duration;

/// Browser-like user agent; some forums reject default client identifiers
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Accept header sent with every page request
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// CSS selectors used to locate posts and their fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSelectors {
    /// One element per post
    pub post: String,

    /// Message body inside a post; posts without it are skipped
    pub body: String,

    /// Element carrying the post timestamp in its `datetime` attribute
    pub date: String,

    /// Element whose text is the author's display name
    pub username: String,

    /// Link whose text is the post number, e.g. `#42`
    pub post_number: String,

    /// Link that only exists when there is a next page
    pub next_page: String,
}

impl Default for PostSelectors {
    fn default() -> Self {
        Self {
            post: "article.message".to_string(),
            body: "div.message-userContent".to_string(),
            date: "time".to_string(),
            username: "h4.message-name".to_string(),
            post_number: "a.message-number".to_string(),
            next_page: "nav.pageNavWrapper a.pageNav-jump--next".to_string(),
        }
    }
}

/// Configuration for the thread scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// URL of the first page of the thread
    pub thread_url: String,

    /// First page to fetch (1-based)
    pub start_page: u32,

    /// Last page to fetch, if bounded
    pub end_page: Option<u32>,

    /// Delay in milliseconds between page requests
    pub delay_ms: u64,

    /// Request timeout. `None` waits on the server indefinitely
    pub timeout: Option<Duration>,

    /// User agent to use for requests
    pub user_agent: String,

    /// Accept header to use for requests
    pub accept: String,

    /// Where the post fields live in the markup
    pub selectors: PostSelectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            thread_url: String::new(),
            start_page: 1,
            end_page: None,
            delay_ms: 2000,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            selectors: PostSelectors::default(),
        }
    }
}

/// Builder for ScraperConfig
#[derive(Debug, Default)]
pub struct ScraperConfigBuilder {
    config: ScraperConfig,
}

impl ScraperConfigBuilder {
    /// Create a new builder for the given thread
    pub fn new(thread_url: impl Into<String>) -> Self {
        Self {
            config: ScraperConfig {
                thread_url: thread_url.into(),
                ..ScraperConfig::default()
            },
        }
    }

    /// Set the first page to fetch
    pub fn start_page(mut self, start_page: u32) -> Self {
        self.config.start_page = start_page;
        self
    }

    /// Set the last page to fetch. `Some(0)` means no bound.
    pub fn end_page(mut self, end_page: Option<u32>) -> Self {
        self.config.end_page = end_page.filter(|&page| page > 0);
        self
    }

    /// Set the delay in milliseconds between page requests
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the Accept header to use for requests
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.config.accept = accept.into();
        self
    }

    /// Set the selectors used for extraction
    pub fn selectors(mut self, selectors: PostSelectors) -> Self {
        self.config.selectors = selectors;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScraperConfig {
        self.config
    }
}

impl ScraperConfig {
    /// Create a new builder
    pub fn builder(thread_url: impl Into<String>) -> ScraperConfigBuilder {
        ScraperConfigBuilder::new(thread_url)
    }

    /// Get the inter-page delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::builder("https://forum.example/threads/t.1/").build();

        assert_eq!(config.start_page, 1);
        assert_eq!(config.end_page, None);
        assert_eq!(config.delay(), Duration::from_secs(2));
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.selectors.post, "article.message");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ScraperConfig::builder("https://forum.example/threads/t.1/")
            .start_page(3)
            .end_page(Some(7))
            .delay_ms(0)
            .timeout(Some(Duration::from_secs(30)))
            .user_agent("test-agent")
            .build();

        assert_eq!(config.start_page, 3);
        assert_eq!(config.end_page, Some(7));
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_end_page_zero_means_unbounded() {
        let config = ScraperConfig::builder("https://forum.example/threads/t.1/")
            .end_page(Some(0))
            .build();
        assert_eq!(config.end_page, None);
    }
}
