/// BERT for Sequence Classification (sentiment analysis)
pub mod sequence_classification;
