use crate::error::{Error, Result};

use super::encoding::Encodings;

/// One encoded review, with its target when the dataset is labeled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Token ids, `max_length` long
    pub input_ids: Vec<u32>,

    /// Attention mask, `max_length` long
    pub attention_mask: Vec<u32>,

    /// Token type ids, `max_length` long
    pub token_type_ids: Vec<u32>,

    /// Binary sentiment target
    pub target: Option<u8>,
}

/// Encodings paired one-to-one with optional targets.
///
/// Immutable after construction, so it can be shared across data loader workers.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    encodings: Encodings,
    targets: Option<Vec<u8>>,
}

impl EncodedDataset {
    /// Pair encodings with targets, which must cover every row
    pub fn new(encodings: Encodings, targets: Option<Vec<u8>>) -> Result<Self> {
        if let Some(targets) = &targets {
            if targets.len() != encodings.len() {
                return Err(Error::Schema(format!(
                    "{} encodings but {} targets",
                    encodings.len(),
                    targets.len()
                )));
            }
        }

        Ok(Self { encodings, targets })
    }

    /// The item at position `index`
    pub fn item(&self, index: usize) -> Result<Item> {
        if index >= self.length() {
            return Err(Error::Index {
                index,
                len: self.length(),
            });
        }

        Ok(Item {
            input_ids: self.encodings.input_ids(index).to_vec(),
            attention_mask: self.encodings.attention_mask(index).to_vec(),
            token_type_ids: self.encodings.token_type_ids(index).to_vec(),
            target: self.targets.as_ref().map(|targets| targets[index]),
        })
    }

    /// The number of items
    pub fn length(&self) -> usize {
        self.encodings.len()
    }

    /// The targets, when the dataset is labeled
    pub fn targets(&self) -> Option<&[u8]> {
        self.targets.as_deref()
    }

    /// The row length of every item
    pub fn max_length(&self) -> usize {
        self.encodings.max_length
    }
}

impl burn::data::dataset::Dataset<Item> for EncodedDataset {
    fn get(&self, index: usize) -> Option<Item> {
        self.item(index).ok()
    }

    fn len(&self) -> usize {
        self.length()
    }
}

#[cfg(test)]
mod tests {
    use burn::data::dataset::Dataset;
    use pretty_assertions::assert_eq;

    use crate::pipelines::sentiment::testing;

    use super::*;

    #[test]
    fn test_item_with_targets() {
        let encodings = testing::encoder(6)
            .encode(&["хороший товар", "плохой товар"], 1)
            .unwrap();

        let dataset = EncodedDataset::new(encodings, Some(vec![1, 0])).unwrap();

        assert_eq!(dataset.length(), 2);
        assert_eq!(
            dataset.item(1).unwrap(),
            Item {
                input_ids: vec![2, 6, 5, 3, 0, 0],
                attention_mask: vec![1, 1, 1, 1, 0, 0],
                token_type_ids: vec![0; 6],
                target: Some(0),
            }
        );
        assert_eq!(dataset.item(1).unwrap(), dataset.item(1).unwrap());
    }

    #[test]
    fn test_item_without_targets() {
        let encodings = testing::encoder(6).encode(&["отличный"], 1).unwrap();

        let dataset = EncodedDataset::new(encodings, None).unwrap();

        assert_eq!(dataset.item(0).unwrap().target, None);
        assert_eq!(dataset.targets(), None);
    }

    #[test]
    fn test_item_out_of_range() {
        let encodings = testing::encoder(6).encode(&["отличный"], 1).unwrap();
        let dataset = EncodedDataset::new(encodings, None).unwrap();

        assert!(matches!(
            dataset.item(1),
            Err(Error::Index { index: 1, len: 1 })
        ));
        assert!(dataset.get(1).is_none());
    }

    #[test]
    fn test_new_rejects_misaligned_targets() {
        let encodings = testing::encoder(6).encode(&["отличный"], 1).unwrap();

        assert!(matches!(
            EncodedDataset::new(encodings, Some(vec![1, 0])),
            Err(Error::Schema(_))
        ));
    }
}
