//! Post extraction from thread pages
//!
//! Extraction is best-effort. A missing field leaves that field empty and a
//! post without a message body is skipped; neither stops the scrape.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::archive::Post;
use crate::crawler::config::PostSelectors;
use crate::crawler::error::{CrawlError, ExtractError};

/// Everything the pagination loop needs from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtract {
    /// Number of post containers found, including skipped ones
    pub containers: usize,

    /// Posts that were extracted, in document order
    pub posts: Vec<Post>,

    /// Whether the page links to a next page
    pub has_next_page: bool,
}

/// Compiled selectors for one scrape run
#[derive(Debug, Clone)]
pub struct PostExtractor {
    post: Selector,
    body: Selector,
    date: Selector,
    username: Selector,
    post_number: Selector,
    next_page: Selector,
}

fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Join the element's text nodes one per line, dropping blank ones
fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl PostExtractor {
    /// Compile the configured selectors. Fails on the first invalid one.
    pub fn new(selectors: &PostSelectors) -> Result<Self, CrawlError> {
        Ok(Self {
            post: compile(&selectors.post)?,
            body: compile(&selectors.body)?,
            date: compile(&selectors.date)?,
            username: compile(&selectors.username)?,
            post_number: compile(&selectors.post_number)?,
            next_page: compile(&selectors.next_page)?,
        })
    }

    /// Parse a page and extract every post on it
    pub fn extract_page(&self, html: &str) -> PageExtract {
        let document = Html::parse_document(html);

        let mut containers = 0;
        let mut posts = Vec::new();
        for element in document.select(&self.post) {
            containers += 1;
            match self.extract_post(element) {
                Ok(post) => posts.push(post),
                Err(e) => warn!("Skipping post {}: {}", containers, e),
            }
        }

        PageExtract {
            containers,
            posts,
            has_next_page: self.has_next_page(&document),
        }
    }

    /// Extract one post from its container element
    pub fn extract_post(&self, element: ElementRef<'_>) -> Result<Post, ExtractError> {
        let body = element
            .select(&self.body)
            .next()
            .ok_or(ExtractError::MissingBody)?;

        Ok(Post {
            post_number: soft(self.post_number(element)),
            username: soft(self.username(element)),
            date: soft(self.date(element)),
            content: block_text(body),
        })
    }

    /// Whether the document has a next-page navigation link
    pub fn has_next_page(&self, document: &Html) -> bool {
        document.select(&self.next_page).next().is_some()
    }

    fn date(&self, element: ElementRef<'_>) -> Result<String, ExtractError> {
        element
            .select(&self.date)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .map(str::to_string)
            .ok_or(ExtractError::MissingField("date"))
    }

    fn username(&self, element: ElementRef<'_>) -> Result<String, ExtractError> {
        element
            .select(&self.username)
            .next()
            .map(stripped_text)
            .ok_or(ExtractError::MissingField("username"))
    }

    fn post_number(&self, element: ElementRef<'_>) -> Result<String, ExtractError> {
        element
            .select(&self.post_number)
            .next()
            .map(|link| {
                let text = stripped_text(link);
                text.strip_prefix('#').unwrap_or(&text).to_string()
            })
            .ok_or(ExtractError::MissingField("post number"))
    }
}

/// Text nodes trimmed and joined with no separator
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

fn soft(field: Result<String, ExtractError>) -> Option<String> {
    match field {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// XenForo-style markup for one post
    pub(crate) fn post_html(number: u32, username: &str, body: &str) -> String {
        format!(
            r#"<article class="message message--post">
                <div class="message-cell message-cell--user">
                    <h4 class="message-name"><a href="/members/{username}.1/">{username}</a></h4>
                </div>
                <div class="message-cell message-cell--main">
                    <ul class="message-attribution-main">
                        <li><a href="/threads/t.1/post-{number}"><time class="u-dt" datetime="2016-03-01T10:{minute:02}:00+0000">Mar 1, 2016</time></a></li>
                    </ul>
                    <ul class="message-attribution-opposite">
                        <li><a class="message-number" href="/threads/t.1/post-{number}">#{number}</a></li>
                    </ul>
                    <div class="message-userContent">
                        <article class="message-body"><div class="bbWrapper">{body}</div></article>
                    </div>
                </div>
            </article>"#,
            number = number,
            username = username,
            minute = number % 60,
            body = body,
        )
    }

    /// A full page with the given posts and an optional next-page link
    pub(crate) fn page_html(posts: &[String], next_page: bool) -> String {
        let nav = if next_page {
            r#"<nav class="pageNavWrapper"><div class="pageNav"><a class="pageNav-jump pageNav-jump--next" href="page-2">Next</a></div></nav>"#
        } else {
            r#"<nav class="pageNavWrapper"><div class="pageNav"><a class="pageNav-jump pageNav-jump--prev" href="page-1">Prev</a></div></nav>"#
        };
        format!(
            "<html><body>{}<div class=\"block-body\">{}</div>{}</body></html>",
            nav,
            posts.join("\n"),
            nav
        )
    }

    fn extractor() -> PostExtractor {
        PostExtractor::new(&PostSelectors::default()).unwrap()
    }

    #[test]
    fn test_extract_all_fields() {
        let html = page_html(
            &[post_html(42, "Fok", "Lovely cloth.<br>\n  Made in London.  ")],
            false,
        );

        let page = extractor().extract_page(&html);

        assert_eq!(page.containers, 1);
        assert_eq!(
            page.posts,
            vec![Post {
                post_number: Some("42".to_string()),
                username: Some("Fok".to_string()),
                date: Some("2016-03-01T10:42:00+0000".to_string()),
                content: "Lovely cloth.\nMade in London.".to_string(),
            }]
        );
    }

    #[test]
    fn test_block_elements_become_lines() {
        let html = page_html(
            &[post_html(
                1,
                "a",
                "<p>First paragraph</p><blockquote><div>Quoted <b>text</b></div></blockquote><ul><li>one</li><li>two</li></ul>",
            )],
            false,
        );

        let page = extractor().extract_page(&html);

        assert_eq!(
            page.posts[0].content,
            "First paragraph\nQuoted\ntext\none\ntwo"
        );
    }

    #[test]
    fn test_nested_username_nodes_are_joined() {
        let post = post_html(1, "Foo", "body")
            .replace(">Foo</a>", "><span>Foo</span> <em>Bar</em></a>");
        let html = page_html(&[post], false);

        let page = extractor().extract_page(&html);

        assert_eq!(page.posts[0].username.as_deref(), Some("FooBar"));
        assert_eq!(page.posts[0].post_number.as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_body_skips_post() {
        let html = page_html(
            &[
                r#"<article class="message"><h4 class="message-name">ghost</h4></article>"#
                    .to_string(),
                post_html(2, "b", "still here"),
            ],
            false,
        );

        let page = extractor().extract_page(&html);

        assert_eq!(page.containers, 2);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post_number.as_deref(), Some("2"));
    }

    #[test]
    fn test_missing_fields_are_null() {
        let html = page_html(
            &[r#"<article class="message"><div class="message-userContent"> only text </div></article>"#
                .to_string()],
            false,
        );

        let page = extractor().extract_page(&html);

        assert_eq!(
            page.posts,
            vec![Post {
                post_number: None,
                username: None,
                date: None,
                content: "only text".to_string(),
            }]
        );
    }

    #[test]
    fn test_time_without_datetime_attribute() {
        let html = page_html(
            &[r#"<article class="message"><time>yesterday</time><div class="message-userContent">x</div></article>"#
                .to_string()],
            false,
        );

        let page = extractor().extract_page(&html);
        assert_eq!(page.posts[0].date, None);
    }

    #[test]
    fn test_next_page_detection() {
        let with_next = page_html(&[post_html(1, "a", "x")], true);
        let without_next = page_html(&[post_html(1, "a", "x")], false);

        assert!(extractor().extract_page(&with_next).has_next_page);
        assert!(!extractor().extract_page(&without_next).has_next_page);
    }

    #[test]
    fn test_next_link_outside_page_nav_is_ignored() {
        let html = format!(
            r#"<html><body>{}<a class="pageNav-jump--next" href="page-2">Next</a></body></html>"#,
            post_html(1, "a", "x")
        );

        assert!(!extractor().extract_page(&html).has_next_page);
    }

    #[test]
    fn test_page_without_posts() {
        let page = extractor().extract_page("<html><body><p>Thread not found</p></body></html>");

        assert_eq!(page, PageExtract::default());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let selectors = PostSelectors {
            post: "article[".to_string(),
            ..PostSelectors::default()
        };

        let result = PostExtractor::new(&selectors);
        assert!(matches!(result, Err(CrawlError::Selector { .. })));
    }
}
