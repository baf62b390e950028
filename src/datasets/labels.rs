use crate::error::{Error, Result};

use super::table::{Labels, Table, LABEL_COLUMN};

/// Ratings strictly above this value are positive
pub const POSITIVE_THRESHOLD: i64 = 3;

/// Map an ordinal rating to a binary sentiment target
pub fn to_target(rating: i64) -> u8 {
    u8::from(rating > POSITIVE_THRESHOLD)
}

/// Replace the `label` column of ratings with a binary `target` column
pub fn binarize(table: Table) -> Result<Table> {
    match table.labels {
        Labels::Rating(ratings) => Ok(Table {
            texts: table.texts,
            labels: Labels::Target(ratings.into_iter().map(to_target).collect()),
        }),
        _ => Err(Error::MissingColumn(LABEL_COLUMN.to_string())),
    }
}
