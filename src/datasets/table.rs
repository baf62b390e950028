use std::{
    collections::HashSet,
    fs::File,
    io::{Read, Write},
    path::Path,
};

use log::debug;

use crate::{
    error::{Error, Result},
    text,
};

/// Canonical name of the review text column
pub static TEXT_COLUMN: &str = "reviewText";

/// Canonical name of the ordinal rating column
pub static LABEL_COLUMN: &str = "label";

/// Canonical name of the binary sentiment column
pub static TARGET_COLUMN: &str = "target";

/// The role a label column plays in a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Ordinal ratings, 1 to 5
    Rating,
    /// Binary sentiment targets, 0 or 1
    Target,
}

/// Column layout detected once when a table is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Review text paired with a label column
    Labeled {
        /// Position of the text column
        text: usize,
        /// Position of the label column
        label: usize,
        /// What the label column holds
        kind: LabelKind,
    },
    /// Review text only, valid for inference
    Unlabeled {
        /// Position of the text column
        text: usize,
    },
    /// No layout could be reconciled
    Unknown,
}

impl Schema {
    /// Reconcile arbitrary column names into the canonical layout.
    ///
    /// Canonical names are matched first. Otherwise a single column is unlabeled text and two
    /// columns are text followed by a rating, unless the values show the rating comes first.
    pub fn detect<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Self {
        let position = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);

        if let Some(text) = position(TEXT_COLUMN) {
            if let Some(label) = position(LABEL_COLUMN) {
                return Schema::Labeled {
                    text,
                    label,
                    kind: LabelKind::Rating,
                };
            }

            if let Some(label) = position(TARGET_COLUMN) {
                return Schema::Labeled {
                    text,
                    label,
                    kind: LabelKind::Target,
                };
            }

            if headers.len() == 1 {
                return Schema::Unlabeled { text };
            }
        }

        match headers.len() {
            1 => Schema::Unlabeled { text: 0 },
            2 => {
                let numeric = |column: usize| {
                    !rows.is_empty() && rows.iter().all(|row| parse_rating(&row[column]).is_some())
                };

                let (text, label) = if numeric(0) && !numeric(1) {
                    (1, 0)
                } else {
                    (0, 1)
                };

                Schema::Labeled {
                    text,
                    label,
                    kind: LabelKind::Rating,
                }
            }
            _ => Schema::Unknown,
        }
    }
}

/// The label column of a table, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Labels {
    /// Ordinal ratings in a `label` column
    Rating(Vec<i64>),
    /// Binary targets in a `target` column
    Target(Vec<u8>),
    /// No label column, inference only
    Absent,
}

impl Labels {
    fn len(&self) -> Option<usize> {
        match self {
            Labels::Rating(values) => Some(values.len()),
            Labels::Target(values) => Some(values.len()),
            Labels::Absent => None,
        }
    }
}

/// A reconciled table of reviews with an optional label column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Review texts, one per row
    pub texts: Vec<String>,

    /// The label column, row-aligned with `texts`
    pub labels: Labels,
}

impl Table {
    /// Build a table, checking that the label column is row-aligned with the texts
    pub fn new(texts: Vec<String>, labels: Labels) -> Result<Self> {
        if let Some(len) = labels.len() {
            if len != texts.len() {
                return Err(Error::Schema(format!(
                    "{} texts but {} labels",
                    texts.len(),
                    len
                )));
            }
        }

        Ok(Self { texts, labels })
    }

    /// A label-less table of texts
    pub fn unlabeled(texts: Vec<String>) -> Self {
        Self {
            texts,
            labels: Labels::Absent,
        }
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Binary targets, failing when the table has no `target` column
    pub fn targets(&self) -> Result<&[u8]> {
        match &self.labels {
            Labels::Target(targets) => Ok(targets),
            _ => Err(Error::MissingColumn(TARGET_COLUMN.to_string())),
        }
    }

    /// Normalize every review text in place
    pub fn normalize(mut self) -> Self {
        for text in self.texts.iter_mut() {
            *text = text::normalize(text);
        }

        self
    }

    /// Drop rows whose text is empty, such as reviews with no Russian words left after
    /// normalization
    pub fn drop_empty(self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| !self.texts[i].is_empty())
            .collect();

        if keep.len() == self.len() {
            return self;
        }

        debug!("Dropped {} rows with empty text", self.len() - keep.len());

        self.select(&keep)
    }

    /// Keep the rows at the given positions, in the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        let texts = indices.iter().map(|&i| self.texts[i].clone()).collect();

        let labels = match &self.labels {
            Labels::Rating(values) => Labels::Rating(indices.iter().map(|&i| values[i]).collect()),
            Labels::Target(values) => Labels::Target(indices.iter().map(|&i| values[i]).collect()),
            Labels::Absent => Labels::Absent,
        };

        Self { texts, labels }
    }

    /// Drop exact duplicate rows, keeping first occurrences in their original order
    pub fn dedup(self) -> Self {
        let keys: Vec<(String, Option<i64>)> = (0..self.len())
            .map(|i| {
                let label = match &self.labels {
                    Labels::Rating(values) => Some(values[i]),
                    Labels::Target(values) => Some(values[i] as i64),
                    Labels::Absent => None,
                };

                (self.texts[i].clone(), label)
            })
            .collect();

        let mut seen = HashSet::with_capacity(keys.len());
        let keep: Vec<usize> = keys
            .into_iter()
            .enumerate()
            .filter_map(|(i, key)| seen.insert(key).then_some(i))
            .collect();

        if keep.len() == self.len() {
            return self;
        }

        debug!("Dropped {} duplicate rows", self.len() - keep.len());

        self.select(&keep)
    }

    /// Write the table as CSV with canonical column names
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        match &self.labels {
            Labels::Rating(values) => {
                writer.write_record([TEXT_COLUMN, LABEL_COLUMN])?;
                for (text, value) in self.texts.iter().zip(values) {
                    writer.write_record([text.as_str(), &value.to_string()])?;
                }
            }
            Labels::Target(values) => {
                writer.write_record([TEXT_COLUMN, TARGET_COLUMN])?;
                for (text, value) in self.texts.iter().zip(values) {
                    writer.write_record([text.as_str(), &value.to_string()])?;
                }
            }
            Labels::Absent => {
                writer.write_record([TEXT_COLUMN])?;
                for text in self.texts.iter() {
                    writer.write_record([text.as_str()])?;
                }
            }
        }

        writer.flush()?;

        Ok(())
    }

    /// Save the table to a CSV file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        self.write_csv(File::create(path)?)
    }
}

/// Read a delimited table from a file, reconciling its schema and dropping duplicate rows
pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();

    debug!("Loading table from {}", path.display());

    read(File::open(path)?)
}

/// Read a delimited table from a file, keeping every row in file order
pub fn load_all<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();

    debug!("Loading all rows of {}", path.display());

    read_all(File::open(path)?)
}

/// Read a comma-delimited table from any reader, such as an uploaded file, dropping duplicate rows
pub fn read<R: Read>(reader: R) -> Result<Table> {
    read_rows(reader, true)
}

/// Read a comma-delimited table from any reader, keeping every row in order
pub fn read_all<R: Read>(reader: R) -> Result<Table> {
    read_rows(reader, false)
}

fn read_rows<R: Read>(reader: R, drop_duplicates: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(schema_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() {
        return Err(Error::Schema("the table has no columns".to_string()));
    }

    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for record in reader.records() {
        let row: Vec<String> = record
            .map_err(schema_error)?
            .iter()
            .map(str::to_string)
            .collect();

        if !drop_duplicates || seen.insert(row.clone()) {
            rows.push(row);
        }
    }

    let schema = Schema::detect(&headers, &rows);

    debug!("Detected schema {:?} for columns {:?}", schema, headers);

    match schema {
        Schema::Labeled { text, label, kind } => {
            let texts = rows.iter().map(|row| row[text].clone()).collect();

            let labels = match kind {
                LabelKind::Rating => Labels::Rating(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| {
                            parse_rating(&row[label]).ok_or_else(|| invalid_value(i, &row[label]))
                        })
                        .collect::<Result<_>>()?,
                ),
                LabelKind::Target => Labels::Target(
                    rows.iter()
                        .enumerate()
                        .map(|(i, row)| {
                            parse_target(&row[label]).ok_or_else(|| invalid_value(i, &row[label]))
                        })
                        .collect::<Result<_>>()?,
                ),
            };

            Table::new(texts, labels)
        }
        Schema::Unlabeled { text } => Ok(Table::unlabeled(
            rows.into_iter().map(|mut row| row.swap_remove(text)).collect(),
        )),
        Schema::Unknown => Err(Error::Schema(format!(
            "unable to reconcile columns {:?} into a review table",
            headers
        ))),
    }
}

fn schema_error(error: csv::Error) -> Error {
    Error::Schema(error.to_string())
}

fn invalid_value(row: usize, value: &str) -> Error {
    Error::Schema(format!("row {row}: label {value:?} is not numeric"))
}

/// Parse an ordinal rating, accepting integral floats such as `4.0`
fn parse_rating(value: &str) -> Option<i64> {
    let value = value.trim();

    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn parse_target(value: &str) -> Option<u8> {
    match parse_rating(value)? {
        0 => Some(0),
        1 => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_read_canonical_rating_table() {
        let csv = "reviewText,label\nХороший товар,5\nПлохой товар,2\nХороший товар,5\n";
        let table = read(csv.as_bytes()).unwrap();

        assert_eq!(table.texts, vec!["Хороший товар", "Плохой товар"]);
        assert_eq!(table.labels, Labels::Rating(vec![5, 2]));
    }

    #[test]
    fn test_read_canonical_target_table() {
        let csv = "target,reviewText\n1,Отлично\n0,Ужасно\n";
        let table = read(csv.as_bytes()).unwrap();

        assert_eq!(table.texts, vec!["Отлично", "Ужасно"]);
        assert_eq!(table.labels, Labels::Target(vec![1, 0]));
    }

    #[test]
    fn test_read_renames_positional_columns() {
        let csv = "text,stars\nНормально,3.0\nПрекрасно,5\n";
        let table = read(csv.as_bytes()).unwrap();

        assert_eq!(table.texts, vec!["Нормально", "Прекрасно"]);
        assert_eq!(table.labels, Labels::Rating(vec![3, 5]));
    }

    #[test]
    fn test_read_detects_rating_first() {
        let csv = "stars,text\n4,Неплохо\n1,Отвратительно\n";
        let table = read(csv.as_bytes()).unwrap();

        assert_eq!(table.texts, vec!["Неплохо", "Отвратительно"]);
        assert_eq!(table.labels, Labels::Rating(vec![4, 1]));
    }

    #[test]
    fn test_read_single_column_is_unlabeled() {
        let csv = "0\nПервый отзыв\nВторой отзыв\n";
        let table = read(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.labels, Labels::Absent);
        assert!(matches!(
            table.targets(),
            Err(Error::MissingColumn(column)) if column == "target"
        ));
    }

    #[test]
    fn test_read_all_keeps_duplicates() {
        let csv = "reviewText,label\nХорошо,5\nПлохо,1\nХорошо,5\n";

        assert_eq!(read(csv.as_bytes()).unwrap().len(), 2);

        let table = read_all(csv.as_bytes()).unwrap();
        assert_eq!(table.texts, vec!["Хорошо", "Плохо", "Хорошо"]);
        assert_eq!(table.labels, Labels::Rating(vec![5, 1, 5]));
    }

    #[test]
    fn test_read_rejects_non_numeric_labels() {
        let csv = "reviewText,label\nХорошо,пять\n";

        assert!(matches!(read(csv.as_bytes()), Err(Error::Schema(_))));
    }

    #[test]
    fn test_read_rejects_ragged_rows() {
        let csv = "reviewText,label\nХорошо,5,лишнее\n";

        assert!(matches!(read(csv.as_bytes()), Err(Error::Schema(_))));
    }

    #[test]
    fn test_detect_unknown_layout() {
        let headers = ["a", "b", "c"];

        assert_eq!(Schema::detect(&headers, &[]), Schema::Unknown);
        assert!(matches!(
            read("a,b,c\n1,2,3\n".as_bytes()),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let table = Table::new(
            vec!["а".into(), "б".into(), "а".into(), "а".into()],
            Labels::Target(vec![1, 0, 1, 0]),
        )
        .unwrap()
        .dedup();

        assert_eq!(table.texts, vec!["а", "б", "а"]);
        assert_eq!(table.labels, Labels::Target(vec![1, 0, 0]));
    }

    #[test]
    fn test_drop_empty_after_normalize() {
        let table = Table::new(
            vec!["Хорошо!".into(), "10/10 OK".into(), "Плохо".into()],
            Labels::Target(vec![1, 1, 0]),
        )
        .unwrap()
        .normalize()
        .drop_empty();

        assert_eq!(table.texts, vec!["хорошо !", "плохо"]);
        assert_eq!(table.labels, Labels::Target(vec![1, 0]));
    }

    #[test]
    fn test_new_rejects_misaligned_labels() {
        let result = Table::new(vec!["а".into()], Labels::Target(vec![1, 0]));

        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("train.csv");

        let table = Table::new(
            vec!["хороший , товар".into(), "плохой товар".into()],
            Labels::Target(vec![1, 0]),
        )
        .unwrap();

        table.save(&path).unwrap();

        assert_eq!(load(&path).unwrap(), table);
    }
}
