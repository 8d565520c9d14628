//! Main-content extraction for web pages.

use std::{collections::HashMap, sync::LazyLock};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::{
    error::{PrecisError, Result},
    types::Article,
};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Words per minute used for the time-to-read estimate
const WORDS_PER_MINUTE: u64 = 300;

/// Candidate containers, most specific first
const CONTAINERS: &[&str] = &["article", "main", "[role=main]", "body"];

/// Elements whose text counts as readable content
const BLOCKS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "pre",
];

/// Elements whose subtree never counts as content
const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "aside", "form", "template",
];

static META: LazyLock<Selector> = LazyLock::new(|| selector("meta[content]"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel=canonical][href]"));
static BLOCK: LazyLock<Selector> = LazyLock::new(|| selector(&BLOCKS.join(", ")));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Fetches a page and extracts its readable article.
#[derive(Debug, Clone, Default)]
pub struct ArticleExtractor {
    client: reqwest::Client,
}

impl ArticleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `url` and extract its article.
    ///
    /// Returns `Ok(None)` when the response is not an HTML page or nothing
    /// readable was found in it.
    pub async fn extract(&self, url: &str) -> Result<Option<Article>> {
        debug!(%url, "Fetching article");
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html, application/xhtml+xml, */*;q=0.8")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PrecisError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !is_html(content_type.as_deref(), &body) {
            info!(%url, ?content_type, "Response is not an HTML page");
            return Ok(None);
        }

        let article = parse_article(&body, &final_url);
        if article.is_none() {
            info!(%url, "No readable content found");
        }
        Ok(article)
    }
}

/// Check if content is HTML based on content type and body
fn is_html(content_type: Option<&str>, body: &str) -> bool {
    if let Some(ct) = content_type {
        let ct = ct.to_lowercase();
        if ct.contains("text/html") || ct.contains("application/xhtml") {
            return true;
        }
        if !ct.starts_with("text/plain") {
            return false;
        }
    }

    let start = body.trim_start().to_lowercase();
    start.starts_with("<!doctype html") || start.starts_with("<html")
}

/// Extract the article from an HTML document fetched from `url`.
pub fn parse_article(html: &str, url: &str) -> Option<Article> {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();
    let meta = collect_meta(&document);
    let first_meta = |keys: &[&str]| keys.iter().find_map(|key| meta.get(*key).cloned());

    let title = first_meta(&["og:title", "twitter:title"]).or_else(|| {
        document
            .select(&TITLE)
            .next()
            .map(|title| collapse_whitespace(&title.text().collect::<String>()))
            .filter(|title| !title.is_empty())
    });

    let container = CONTAINERS.iter().find_map(|css| {
        document
            .select(&selector(css))
            .map(|element| (element, readable_text(element)))
            .find(|(_, text)| !text.is_empty())
    });

    if title.is_none() && container.is_none() {
        return None;
    }

    let (content, links) = match container {
        Some((element, text)) => (Some(text), collect_links(element, base.as_ref())),
        None => (None, Vec::new()),
    };

    let words = content
        .as_deref()
        .map(|text| text.split_whitespace().count() as u64)
        .unwrap_or(0);

    let canonical = document
        .select(&CANONICAL)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve(base.as_ref(), href).unwrap_or_else(|| href.to_string()));

    Some(Article {
        url: canonical
            .or_else(|| first_meta(&["og:url"]))
            .or_else(|| Some(url.to_string())),
        title,
        description: first_meta(&["description", "og:description", "twitter:description"]),
        image: first_meta(&["og:image", "twitter:image"]),
        author: first_meta(&["author", "article:author"]),
        source: first_meta(&["og:site_name"])
            .or_else(|| base.as_ref().and_then(|u| u.host_str()).map(str::to_string)),
        published: first_meta(&["article:published_time", "og:published_time", "date"]),
        ttr: words * 60 / WORDS_PER_MINUTE,
        links,
        content,
    })
}

fn collect_meta(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    for element in document.select(&META) {
        let attrs = element.value();
        let Some(key) = attrs.attr("property").or_else(|| attrs.attr("name")) else {
            continue;
        };
        let content = attrs.attr("content").unwrap_or_default().trim();
        if !content.is_empty() {
            meta.entry(key.to_lowercase())
                .or_insert_with(|| content.to_string());
        }
    }
    meta
}

/// Outermost readable blocks under `root`, one per line.
fn readable_text(root: ElementRef<'_>) -> String {
    root.select(&BLOCK)
        .filter(|block| {
            !block
                .ancestors()
                .take_while(|node| node.id() != root.id())
                .any(|node| {
                    node.value().as_element().is_some_and(|el| {
                        SKIPPED.contains(&el.name()) || BLOCKS.contains(&el.name())
                    })
                })
        })
        .map(|block| collapse_whitespace(&block.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_links(root: ElementRef<'_>, base: Option<&Url>) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for anchor in root.select(&LINK) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve(base, href) else {
            continue;
        };
        if (link.starts_with("http://") || link.starts_with("https://")) && !links.contains(&link)
        {
            links.push(link);
        }
    }
    links
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Fallback title</title>
  <meta property="og:title" content="Rust ownership explained">
  <meta name="description" content="A short tour of borrowing.">
  <meta name="author" content="Ferris">
  <meta property="og:site_name" content="Crab Blog">
  <meta property="article:published_time" content="2024-03-01T10:00:00Z">
  <link rel="canonical" href="/posts/ownership">
  <script>var tracking = "<p>not content</p>";</script>
</head>
<body>
  <nav><ul><li>Home</li><li>About</li></ul></nav>
  <article>
    <h1>Rust   ownership</h1>
    <p>Every value has a single <a href="/owners">owner</a>.</p>
    <blockquote><p>Borrowing is temporary.</p></blockquote>
    <ul><li>Move</li><li><a href="https://doc.rust-lang.org">Copy</a></li></ul>
    <aside><p>Subscribe!</p></aside>
  </article>
  <footer><p>Copyright</p></footer>
</body>
</html>"#;

    #[test]
    fn test_parse_article_metadata() {
        let article = parse_article(PAGE, "https://blog.example.com/p?id=1").unwrap();
        assert_eq!(article.title.as_deref(), Some("Rust ownership explained"));
        assert_eq!(
            article.description.as_deref(),
            Some("A short tour of borrowing.")
        );
        assert_eq!(article.author.as_deref(), Some("Ferris"));
        assert_eq!(article.source.as_deref(), Some("Crab Blog"));
        assert_eq!(
            article.url.as_deref(),
            Some("https://blog.example.com/posts/ownership")
        );
        assert_eq!(
            article.published.as_deref(),
            Some("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn test_parse_article_content() {
        let article = parse_article(PAGE, "https://blog.example.com/p?id=1").unwrap();
        assert_eq!(
            article.content.as_deref(),
            Some("Rust ownership\nEvery value has a single owner.\nBorrowing is temporary.\nMove\nCopy")
        );
        assert_eq!(
            article.links,
            vec![
                "https://blog.example.com/owners".to_string(),
                "https://doc.rust-lang.org/".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_article_falls_back_to_body() {
        let html = "<html><head><title>Plain</title></head><body><p>Just text.</p></body></html>";
        let article = parse_article(html, "https://example.com/").unwrap();
        assert_eq!(article.title.as_deref(), Some("Plain"));
        assert_eq!(article.content.as_deref(), Some("Just text."));
        assert_eq!(article.source.as_deref(), Some("example.com"));
        assert_eq!(article.url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_parse_article_title_without_body() {
        let html = "<html><head><title>Only a title</title></head><body></body></html>";
        let article = parse_article(html, "https://example.com/").unwrap();
        assert!(article.content.is_none());
        assert_eq!(article.ttr, 0);
    }

    #[test]
    fn test_parse_article_nothing_readable() {
        let html = "<html><head></head><body><div></div></body></html>";
        assert!(parse_article(html, "https://example.com/").is_none());
    }

    #[test]
    fn test_parse_article_inside_page_form() {
        let html = r#"<html><head><title>Post</title></head><body><form id="form1"><article><p>Every value has an owner.</p><nav><p>Menu</p></nav></article></form></body></html>"#;
        let article = parse_article(html, "https://example.com/").unwrap();
        assert_eq!(article.content.as_deref(), Some("Every value has an owner."));

        let html = r#"<html><body><form><main><p>Borrowing is temporary.</p></main></form></body></html>"#;
        let article = parse_article(html, "https://example.com/").unwrap();
        assert_eq!(article.content.as_deref(), Some("Borrowing is temporary."));
    }

    #[test]
    fn test_time_to_read() {
        let words = vec!["word"; 600].join(" ");
        let html = format!("<html><body><p>{words}</p></body></html>");
        let article = parse_article(&html, "https://example.com/").unwrap();
        assert_eq!(article.ttr, 120);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(Some("text/html; charset=utf-8"), ""));
        assert!(is_html(None, "  <!DOCTYPE html><html></html>"));
        assert!(is_html(Some("text/plain"), "<html></html>"));
        assert!(!is_html(Some("application/json"), "<html></html>"));
        assert!(!is_html(None, "{\"a\": 1}"));
    }
}
