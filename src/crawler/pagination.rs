//! Sequential page traversal for a single thread

use std::fmt;

use tracing::{info, instrument, warn};

use crate::archive::Post;
use crate::crawler::ScraperConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::extraction::PostExtractor;
use crate::crawler::fetcher::Fetcher;

/// Why a scrape stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The page could not be fetched
    FetchFailed { page: u32, error: String },

    /// The page had no post containers
    NoPosts { page: u32 },

    /// The configured end page was reached
    EndPage { page: u32 },

    /// The page had no next-page link
    LastPage { page: u32 },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::FetchFailed { page, error } => {
                write!(f, "failed to fetch page {}: {}", page, error)
            }
            StopReason::NoPosts { page } => write!(f, "page {} has no posts", page),
            StopReason::EndPage { page } => write!(f, "reached end page {}", page),
            StopReason::LastPage { page } => write!(f, "page {} is the last page", page),
        }
    }
}

/// Result of a scrape run
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// Posts from every fetched page, in page order
    pub posts: Vec<Post>,

    /// Number of pages successfully fetched
    pub pages_fetched: u32,

    /// What ended the run
    pub stop_reason: StopReason,
}

/// Scrape a thread page by page.
///
/// One request is in flight at a time, with the configured delay between
/// pages. A failed fetch ends the run but keeps everything gathered so far;
/// the only errors returned are configuration problems found before the
/// first request.
#[instrument(skip(config), fields(url = %config.thread_url))]
pub async fn scrape_thread(config: &ScraperConfig) -> Result<ScrapeOutcome, CrawlError> {
    let extractor = PostExtractor::new(&config.selectors)?;
    let fetcher = Fetcher::new(config)?;

    let mut posts = Vec::new();
    let mut pages_fetched = 0;
    let mut page = config.start_page.max(1);

    let stop_reason = loop {
        println!("Scraping page {}...", page);

        let html = match fetcher.fetch(page).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error fetching page {}: {}", page, e);
                break StopReason::FetchFailed {
                    page,
                    error: e.to_string(),
                };
            }
        };
        pages_fetched += 1;

        let extract = extractor.extract_page(&html);
        if extract.containers == 0 {
            break StopReason::NoPosts { page };
        }

        info!(
            "Page {}: {} posts ({} containers)",
            page,
            extract.posts.len(),
            extract.containers
        );
        posts.extend(extract.posts);

        if config.end_page.is_some_and(|end| page >= end) {
            break StopReason::EndPage { page };
        }

        if !extract.has_next_page {
            break StopReason::LastPage { page };
        }

        page += 1;
        tokio::time::sleep(config.delay()).await;
    };

    info!("Scrape stopped: {}", stop_reason);
    Ok(ScrapeOutcome {
        posts,
        pages_fetched,
        stop_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extraction::tests::{page_html, post_html};
    use mockito::Server;

    fn posts(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
        range.map(|n| post_html(n, &format!("user{}", n), &format!("post body {}", n))).collect()
    }

    fn config_for(server: &Server) -> ScraperConfig {
        ScraperConfig::builder(format!("{}/threads/t.1/", server.url()))
            .delay_ms(0)
            .build()
    }

    #[tokio::test]
    async fn test_two_page_thread() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .with_status(200)
            .with_body(page_html(&posts(1..=20), true))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/threads/t.1/page-2")
            .with_status(200)
            .with_body(page_html(&posts(21..=25), false))
            .expect(1)
            .create_async()
            .await;
        let page3 = server
            .mock("GET", "/threads/t.1/page-3")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let outcome = scrape_thread(&config_for(&server)).await.unwrap();

        assert_eq!(outcome.posts.len(), 25);
        let numbers: Vec<String> = outcome
            .posts
            .iter()
            .map(|p| p.post_number.clone().unwrap())
            .collect();
        let expected: Vec<String> = (1..=25).map(|n| n.to_string()).collect();
        assert_eq!(numbers, expected);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.stop_reason, StopReason::LastPage { page: 2 });

        page1.assert_async().await;
        page2.assert_async().await;
        page3.assert_async().await;
    }

    #[tokio::test]
    async fn test_end_page_bound_wins_over_next_link() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .with_status(200)
            .with_body(page_html(&posts(1..=20), true))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/threads/t.1/page-2")
            .with_status(200)
            .with_body(page_html(&posts(21..=25), false))
            .expect(0)
            .create_async()
            .await;

        let config = ScraperConfig::builder(format!("{}/threads/t.1/", server.url()))
            .delay_ms(0)
            .end_page(Some(1))
            .build();
        let outcome = scrape_thread(&config).await.unwrap();

        assert_eq!(outcome.posts.len(), 20);
        assert_eq!(outcome.stop_reason, StopReason::EndPage { page: 1 });

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_end_page_zero_is_unbounded() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .with_status(200)
            .with_body(page_html(&posts(1..=20), true))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/threads/t.1/page-2")
            .with_status(200)
            .with_body(page_html(&posts(21..=25), false))
            .expect(1)
            .create_async()
            .await;

        let config = ScraperConfig::builder(format!("{}/threads/t.1/", server.url()))
            .delay_ms(0)
            .end_page(Some(0))
            .build();
        let outcome = scrape_thread(&config).await.unwrap();

        assert_eq!(outcome.posts.len(), 25);
        assert_eq!(outcome.stop_reason, StopReason::LastPage { page: 2 });

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_page_without_posts_stops_cleanly() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .with_status(200)
            .with_body(page_html(&[], true))
            .expect(1)
            .create_async()
            .await;

        let outcome = scrape_thread(&config_for(&server)).await.unwrap();

        assert!(outcome.posts.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::NoPosts { page: 1 });

        page1.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_earlier_posts() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .with_status(200)
            .with_body(page_html(&posts(1..=3), true))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/threads/t.1/page-2")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let outcome = scrape_thread(&config_for(&server)).await.unwrap();

        assert_eq!(outcome.posts.len(), 3);
        assert_eq!(outcome.pages_fetched, 1);
        assert!(matches!(
            outcome.stop_reason,
            StopReason::FetchFailed { page: 2, .. }
        ));

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_page_skips_earlier_pages() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .expect(0)
            .create_async()
            .await;
        let page3 = server
            .mock("GET", "/threads/t.1/page-3")
            .with_status(200)
            .with_body(page_html(&posts(41..=45), false))
            .expect(1)
            .create_async()
            .await;

        let config = ScraperConfig::builder(format!("{}/threads/t.1/", server.url()))
            .delay_ms(0)
            .start_page(3)
            .build();
        let outcome = scrape_thread(&config).await.unwrap();

        assert_eq!(outcome.posts.len(), 5);
        assert_eq!(outcome.posts[0].post_number.as_deref(), Some("41"));

        page1.assert_async().await;
        page3.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_before_fetching() {
        let mut server = Server::new_async().await;
        let page1 = server
            .mock("GET", "/threads/t.1/")
            .expect(0)
            .create_async()
            .await;

        let mut config = config_for(&server);
        config.selectors.body = "div[".to_string();

        let result = scrape_thread(&config).await;
        assert!(matches!(result, Err(CrawlError::Selector { .. })));

        page1.assert_async().await;
    }
}
