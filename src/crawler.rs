//! # Thread Scraper Module
//!
//! Walks a paginated forum thread and turns every post into a [`Post`]
//! record. This is the first stage of the pipeline: its output is written by
//! the archive module and later indexed for chat.
//!
//! ## Key Components
//!
//! - `ScraperConfig`: Thread URL, page range, throttle, headers and selectors
//! - `Fetcher`: Plain HTTP GET of one page with browser-like headers
//! - `PostExtractor`: Best-effort extraction of post fields from page markup
//! - `scrape_thread`: The pagination loop that ties them together
//!
//! ## Behaviour
//!
//! - Strictly sequential: one page request in flight, a fixed delay between pages
//! - Stops on a failed fetch, a page without posts, the end-page bound, or a
//!   page without a next-page link, checked in that order
//! - Never retries; failed extraction of a field or post is logged and skipped
//!
//! [`Post`]: crate::archive::Post

mod config;
mod error;
mod extraction;
mod fetcher;
mod pagination;

pub use config::{PostSelectors, ScraperConfig, ScraperConfigBuilder};
pub use error::{CrawlError, ExtractError};
pub use extraction::{PageExtract, PostExtractor};
pub use fetcher::{Fetcher, page_url};
pub use pagination::{ScrapeOutcome, StopReason, scrape_thread};
