use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

/// The maximum number of pages a single scrape request may cover
pub const MAX_SCRAPE_PAGES: usize = 100;

lazy_static! {
    static ref LEADING_CHARACTER: Regex = Regex::new(r"^[а-яА-ЯёЁ0-9]").unwrap();
    static ref RUSSIAN_WORD: Regex = Regex::new(r"\b[а-яА-ЯёЁ]{4,}\b").unwrap();
    static ref REVIEW_URL: Regex =
        Regex::new(r"^https://otzovik\.com/reviews/[a-zA-Z0-9_-]+/\d+/$").unwrap();
}

/// Check free text submitted for single-item prediction.
///
/// Every violated rule is reported, not just the first one.
pub fn validate_review_text(text: &str) -> Result<()> {
    let mut violations = Vec::new();

    if !LEADING_CHARACTER.is_match(text) {
        violations.push("review must start with a Russian letter or a digit".to_string());
    }

    if !RUSSIAN_WORD.is_match(text) {
        violations
            .push("review must contain at least one Russian word of 4 letters or more".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}

/// Check a scrape request: the listing URL must point at a paginated review page and the page
/// count must stay within [`MAX_SCRAPE_PAGES`]
pub fn validate_scrape_request(url: &str, page_count: usize) -> Result<()> {
    let mut violations = Vec::new();

    if !REVIEW_URL.is_match(url) {
        violations.push(format!("invalid review listing URL: {url}"));
    }

    if page_count > MAX_SCRAPE_PAGES {
        violations.push(format!(
            "page count {page_count} exceeds the limit of {MAX_SCRAPE_PAGES}"
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(result: Result<()>) -> Vec<String> {
        match result {
            Err(Error::Validation(violations)) => violations,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_review_text_accepted() {
        assert!(validate_review_text("Плохой товар").is_ok());
        assert!(validate_review_text("5 звёзд, отличный магазин").is_ok());
        assert!(validate_review_text("ёжик доволен покупкой").is_ok());
    }

    #[test]
    fn test_review_text_without_word() {
        let violations = violations(validate_review_text("123"));

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("4 letters"));
    }

    #[test]
    fn test_review_text_reports_every_rule() {
        assert_eq!(violations(validate_review_text("Good product")).len(), 2);
        assert_eq!(violations(validate_review_text("")).len(), 2);
    }

    #[test]
    fn test_review_text_short_words_only() {
        assert_eq!(violations(validate_review_text("да, это так")).len(), 1);
    }

    #[test]
    fn test_scrape_request() {
        assert!(validate_scrape_request("https://otzovik.com/reviews/ozon_ru/2/", 10).is_ok());
        assert!(validate_scrape_request("https://otzovik.com/reviews/ozon_ru/1/", 100).is_ok());

        assert_eq!(
            violations(validate_scrape_request("https://otzovik.com/reviews/ozon_ru/", 5)).len(),
            1
        );
        assert_eq!(
            violations(validate_scrape_request("http://example.com/", 101)).len(),
            2
        );
    }
}
