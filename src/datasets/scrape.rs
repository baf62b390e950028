use std::path::Path;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    text::validate_scrape_request,
};

use super::table::{self, Table};

lazy_static! {
    static ref PAGED_URL: Regex = Regex::new(r"^(.*)/(\d+)/$").unwrap();
}

/// A request to collect reviews from consecutive listing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// The first listing page, such as `https://otzovik.com/reviews/ozon_ru/1/`
    pub url: String,

    /// How many consecutive pages to fetch, starting at `url`
    pub page_count: usize,
}

impl ScrapeRequest {
    /// Check the URL pattern and the page limit
    pub fn validate(&self) -> Result<()> {
        validate_scrape_request(&self.url, self.page_count)
    }

    /// The URLs of every page covered by the request, in order
    pub fn page_urls(&self) -> Result<Vec<String>> {
        let (base, first) = request_params(&self.url)?;

        Ok((0..self.page_count)
            .map(|offset| format!("{}/{}/", base, first + offset))
            .collect())
    }
}

/// Split a listing URL into its base and the page number it points at
pub fn request_params(url: &str) -> Result<(String, usize)> {
    let captures = PAGED_URL
        .captures(url)
        .ok_or_else(|| Error::Validation(vec![format!("URL has no page number: {url}")]))?;

    let page = captures[2]
        .parse()
        .map_err(|_| Error::Validation(vec![format!("page number out of range: {url}")]))?;

    Ok((captures[1].to_string(), page))
}

/// An external fetcher that returns the review texts found on one listing page
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch the raw review texts linked from the page at `url`
    async fn fetch_page(&self, url: &str) -> Result<Vec<String>>;
}

/// An append-only collection of raw review texts gathered across page fetches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeCorpus {
    texts: Vec<String>,
}

impl ScrapeCorpus {
    /// Create an empty corpus
    pub fn new() -> Self {
        Self::default()
    }

    /// Append texts at the end of the corpus
    pub fn append<I: IntoIterator<Item = String>>(&mut self, texts: I) {
        self.texts.extend(texts);
    }

    /// The collected texts, in fetch order
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// The number of collected texts
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Persist the corpus as a single-column `reviewText` table
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Table::unlabeled(self.texts.clone()).save(path)
    }

    /// Read a previously saved corpus, repeated reviews included
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            texts: table::load_all(path)?.texts,
        })
    }
}

/// Validate a request and fetch every page it covers into a new corpus
pub async fn collect<S: ReviewSource + ?Sized>(
    source: &S,
    request: &ScrapeRequest,
) -> Result<ScrapeCorpus> {
    request.validate()?;

    let mut corpus = ScrapeCorpus::new();

    for url in request.page_urls()? {
        let texts = source.fetch_page(&url).await?;

        debug!("Fetched {} reviews from {}", texts.len(), url);

        corpus.append(texts);
    }

    info!(
        "Collected {} reviews from {} pages",
        corpus.len(),
        request.page_count
    );

    Ok(corpus)
}
