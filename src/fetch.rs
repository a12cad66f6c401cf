use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use crate::config::HttpSettings;
use crate::error::FetchError;

/// A successfully retrieved page.
///
/// Link extraction is deferred to [`Page::links`] so that its cost lands
/// on whichever pool runs the extraction step, not on the download slot.
pub trait Page: Send {
    /// Absolute outgoing link URLs found on the page, in document order.
    fn links(&self) -> Vec<String>;
}

/// Retrieves pages for the crawl engine.
///
/// `fetch` is synchronous and blocking, and is invoked concurrently from
/// many download worker threads with different URLs.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Box<dyn Page>, FetchError>;
}

/// HTTP fetcher backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Box<dyn Page>, FetchError> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // The final URL after redirects is the base for relative links.
        let base = response.url().clone();
        let body = response.text()?;

        Ok(Box::new(HtmlPage { base, body }))
    }
}

/// An HTML document plus the URL it was served from.
pub struct HtmlPage {
    base: Url,
    body: String,
}

impl HtmlPage {
    pub fn new(base: Url, body: String) -> Self {
        Self { base, body }
    }
}

impl Page for HtmlPage {
    fn links(&self) -> Vec<String> {
        let document = Html::parse_document(&self.body);
        let selector = Selector::parse("a[href]").unwrap();

        let mut links = Vec::new();
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(&self.base, href) {
                    links.push(absolute);
                }
            }
        }

        trace!("{}: {} links", self.base, links.len());
        links
    }
}

/// Resolve an href against the page URL, skipping non-navigable schemes.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    // Fragments address positions within one document, not new pages.
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
