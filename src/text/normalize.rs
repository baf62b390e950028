use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"([.,!?])").unwrap();
    static ref FOREIGN: Regex = Regex::new(r"[^а-яё.,!?]+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]+[.!?]*").unwrap();
}

/// Clean raw review text into a lowercase stream of Russian words and the marks `. , ! ?`,
/// each mark surrounded by single spaces.
///
/// The input is trimmed and lowercased, punctuation is spaced out, every run of characters
/// other than Russian letters and the four marks collapses to one space, and the result is
/// trimmed again. Never fails, and `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = text.trim().to_lowercase();
    let text = PUNCTUATION.replace_all(&text, " $1 ");
    let text = FOREIGN.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Whitespace-separated words of a text
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Split text into sentences ending at `.`, `!` or `?`, keeping the terminal marks
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty() && s.chars().any(char::is_alphanumeric))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Отличный товар, всем рекомендую! Быстрая доставка.",
        "Товар пришёл через 3 дня... OK!!!",
        "Плохо!!Очень плохо??",
        "ЦЕНА: 1500 руб. / качество - так себе :(",
        "\tмного\n\nпробелов   здесь ,,, ",
        "Mixed English и русский text",
        "😀 эмодзи 👍 тоже удаляются",
    ];

    #[test]
    fn test_normalize_spaces_punctuation() {
        assert_eq!(
            normalize("Отличный товар, всем рекомендую! Быстрая доставка."),
            "отличный товар , всем рекомендую ! быстрая доставка ."
        );
    }

    #[test]
    fn test_normalize_strips_latin_and_digits() {
        assert_eq!(normalize("Заказ №123 пришёл OK"), "заказ пришёл");
        assert_eq!(normalize("Mixed English и русский text"), "и русский");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("123 abc"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);

            assert_eq!(normalize(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_normalize_alphabet() {
        for sample in SAMPLES {
            let normalized = normalize(sample);

            assert!(
                normalized
                    .chars()
                    .all(|c| matches!(c, 'а'..='я' | 'ё' | ' ' | '.' | ',' | '!' | '?')),
                "unexpected character in {normalized:?}"
            );
            assert!(!normalized.contains("  "));
        }
    }

    #[test]
    fn test_sentences() {
        let text = normalize("Хороший товар. Доставка быстрая! Рекомендую?");

        assert_eq!(
            sentences(&text),
            vec!["хороший товар .", "доставка быстрая !", "рекомендую ?"]
        );
        assert_eq!(sentences("без точки в конце"), vec!["без точки в конце"]);
        assert!(sentences("").is_empty());
        assert!(sentences(" . ! ").is_empty());
    }
}
