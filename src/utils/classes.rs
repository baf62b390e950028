use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Name of class 0
pub static NEGATIVE: &str = "Negative";

/// Name of class 1
pub static POSITIVE: &str = "Positive";

/// The class names of the sentiment task, indexed by class id
pub static LABELS: [&str; 2] = [NEGATIVE, POSITIVE];

/// A map from class ids to class name labels
pub fn id2label() -> BTreeMap<usize, String> {
    LABELS
        .iter()
        .enumerate()
        .map(|(id, label)| (id, label.to_string()))
        .collect()
}

/// A reverse map from class name labels to class ids
pub fn label2id() -> BTreeMap<String, usize> {
    invert_map(id2label())
}

/// Look up the name of a class id
pub fn label_for(id2label: &BTreeMap<usize, String>, class: usize) -> Result<String> {
    id2label
        .get(&class)
        .cloned()
        .ok_or_else(|| Error::Config(format!("no label is defined for class {class}")))
}

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_label_maps() {
        assert_eq!(id2label()[&0], "Negative");
        assert_eq!(id2label()[&1], "Positive");
        assert_eq!(label2id()["Positive"], 1);
    }

    #[test]
    fn test_label_for_unknown_class() {
        assert!(matches!(label_for(&id2label(), 2), Err(Error::Config(_))));
    }
}
