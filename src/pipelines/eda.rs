//! Exploratory statistics of the training corpus for the dashboard

use std::{collections::HashMap, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    datasets::{
        table::{self, TARGET_COLUMN, TEXT_COLUMN},
        FileCache, Labels, Table,
    },
    error::Result,
    text::{sentences, words},
};

/// The number of most frequent words reported
pub const TOP_WORDS: usize = 30;

/// Only words longer than this count towards word frequencies
const MIN_WORD_CHARS: usize = 3;

/// Tokens never counted as words
static PUNCTUATION: &[&str] = &[
    "!", ",", "(", ")", ":", "-", "?", ".", "..", "...", "«", "»", ";", "–", "--",
];

/// Per-review statistics, named after the dashboard columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaRow {
    /// The normalized review text
    #[serde(rename = "reviewText")]
    pub review_text: String,

    /// The binary target, when the table has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u8>,

    #[serde(rename = "Words_count")]
    pub words_count: usize,

    #[serde(rename = "Sentences_count")]
    pub sentences_count: usize,

    /// Length in characters
    #[serde(rename = "Review_length")]
    pub review_length: usize,

    #[serde(rename = "Mean_word_length")]
    pub mean_word_length: f64,

    /// Mean characters per sentence
    #[serde(rename = "Mean_sentence_length")]
    pub mean_sentence_length: f64,
}

impl EdaRow {
    /// Compute the statistics of one normalized review
    pub fn new(review_text: String, target: Option<u8>) -> Self {
        let word_lengths: Vec<usize> = words(&review_text).map(|w| w.chars().count()).collect();
        let sentence_lengths: Vec<usize> = sentences(&review_text)
            .into_iter()
            .map(|s| s.chars().count())
            .collect();

        Self {
            words_count: word_lengths.len(),
            sentences_count: sentence_lengths.len(),
            review_length: review_text.chars().count(),
            mean_word_length: mean(&word_lengths),
            mean_sentence_length: mean(&sentence_lengths),
            review_text,
            target,
        }
    }
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

/// Dashboard statistics of a corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaReport {
    /// One row per review
    pub rows: Vec<EdaRow>,

    /// The most frequent words, most frequent first
    pub words: Vec<String>,

    /// Occurrences of each word in `words`
    pub counts: Vec<usize>,
}

impl EdaReport {
    /// Compute the report of a table, normalizing its texts first
    pub fn from_table(table: Table) -> Self {
        let table = table.normalize();

        let (words, counts) = most_frequent_words(&table.texts, TOP_WORDS)
            .into_iter()
            .unzip();

        let targets: Vec<Option<u8>> = match &table.labels {
            Labels::Target(targets) => targets.iter().copied().map(Some).collect(),
            _ => vec![None; table.len()],
        };

        let rows = table
            .texts
            .into_iter()
            .zip(targets)
            .map(|(text, target)| EdaRow::new(text, target))
            .collect();

        Self {
            rows,
            words,
            counts,
        }
    }

    /// Render the per-review statistics as CSV, with a `target` column when targets are known
    pub fn to_csv(&self) -> Result<String> {
        let with_target = self.rows.iter().any(|row| row.target.is_some());

        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut headers = vec![TEXT_COLUMN];
        if with_target {
            headers.push(TARGET_COLUMN);
        }
        headers.extend([
            "Words_count",
            "Sentences_count",
            "Review_length",
            "Mean_word_length",
            "Mean_sentence_length",
        ]);
        writer.write_record(&headers)?;

        for row in &self.rows {
            let mut record = vec![row.review_text.clone()];
            if with_target {
                record.push(row.target.map(|t| t.to_string()).unwrap_or_default());
            }
            record.extend([
                row.words_count.to_string(),
                row.sentences_count.to_string(),
                row.review_length.to_string(),
                row.mean_word_length.to_string(),
                row.mean_sentence_length.to_string(),
            ]);
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The `n` most frequent words longer than three characters, skipping punctuation.
///
/// Words with equal counts keep the order of their first occurrence.
pub fn most_frequent_words<S: AsRef<str>>(texts: &[S], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0;

    for text in texts {
        for word in words(text.as_ref()) {
            if PUNCTUATION.contains(&word) || word.chars().count() <= MIN_WORD_CHARS {
                continue;
            }

            counts
                .entry(word)
                .or_insert_with(|| {
                    order += 1;
                    (0, order)
                })
                .0 += 1;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked
        .into_iter()
        .take(n)
        .map(|(word, (count, _))| (word.to_string(), count))
        .collect()
}

/// Computes EDA reports, caching them per file until the file changes
#[derive(Default)]
pub struct Eda {
    cache: FileCache<EdaReport>,
}

impl Eda {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The report of the table at `path`, counting every row as stored
    pub fn report<P: AsRef<Path>>(&self, path: P) -> Result<Arc<EdaReport>> {
        self.cache.get_or_compute(path, |path| {
            Ok(EdaReport::from_table(table::load_all(path)?))
        })
    }

    /// Forget the report of `path`
    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> bool {
        self.cache.invalidate(path)
    }

    /// Forget every report
    pub fn clear(&self) {
        self.cache.clear()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_row_stats() {
        let row = EdaRow::new("хороший товар . быстрая доставка !".to_string(), Some(1));

        assert_eq!(row.words_count, 6);
        assert_eq!(row.sentences_count, 2);
        assert_eq!(row.review_length, 34);
        assert_eq!(row.mean_word_length, 29.0 / 6.0);
        assert_eq!(row.mean_sentence_length, (15.0 + 18.0) / 2.0);
    }

    #[test]
    fn test_row_stats_empty_text() {
        let row = EdaRow::new(String::new(), None);

        assert_eq!(row.words_count, 0);
        assert_eq!(row.sentences_count, 0);
        assert_eq!(row.mean_word_length, 0.0);
        assert_eq!(row.mean_sentence_length, 0.0);
    }

    #[test]
    fn test_most_frequent_words() {
        let texts = [
            "плохой товар , очень плохой",
            "товар отличный , очень быстрый",
            "отличный отличный товар ...",
        ];

        assert_eq!(
            most_frequent_words(&texts, 3),
            vec![
                ("товар".to_string(), 3),
                ("отличный".to_string(), 3),
                ("плохой".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_report_csv() {
        let table = Table::new(
            vec!["Хороший товар!".into(), "Плохо".into()],
            Labels::Target(vec![1, 0]),
        )
        .unwrap();

        let report = EdaReport::from_table(table);

        assert_eq!(report.words, vec!["хороший", "товар", "плохо"]);
        assert_eq!(report.counts, vec![1, 1, 1]);
        assert_eq!(
            report.to_csv().unwrap(),
            "reviewText,target,Words_count,Sentences_count,Review_length,Mean_word_length,Mean_sentence_length\n\
             хороший товар !,1,3,1,15,4.333333333333333,15\n\
             плохо,0,1,1,5,5,5\n"
        );
    }

    #[test]
    fn test_report_is_cached_until_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, "reviewText,target\nхороший товар,1\n").unwrap();

        let eda = Eda::new();
        let first = eda.report(&path).unwrap();
        let second = eda.report(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(eda.invalidate(&path));
        let third = eda.report(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);

        eda.clear();
        assert!(!eda.invalidate(&path));
    }

    #[test]
    fn test_report_counts_repeated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(
            &path,
            "reviewText,target\nхороший товар,1\nхороший товар,1\nплохо,0\n",
        )
        .unwrap();

        let report = Eda::new().report(&path).unwrap();

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.words[0], "хороший");
        assert_eq!(report.counts[0], 2);
    }
}
