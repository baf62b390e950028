use std::{collections::BTreeMap, sync::Arc};

use burn::{
    data::dataloader::{batcher::Batcher as _, DataLoader, DataLoaderBuilder},
    tensor::{activation::softmax, backend::Backend},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    text::normalize,
    utils::{classes::label_for, tensors::float_rows},
};

use super::{
    batcher::{Batcher, Infer},
    Classifier, EncodedDataset, Encoder,
};

/// Share of each predicted class, as percentages with one decimal and a trailing `%`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentStats {
    /// Share of negative predictions, such as `"42.9 %"`
    #[serde(rename = "Negative")]
    pub negative: String,

    /// Share of positive predictions
    #[serde(rename = "Positive")]
    pub positive: String,
}

/// Class probabilities and the winning label for one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePrediction {
    /// Probability per label name, summing to 1
    pub probabilities: BTreeMap<String, f64>,

    /// The most probable label name
    pub predicted_label: String,
}

/// Summarize predicted classes into percentage shares
pub fn summarize(predictions: &[u8]) -> Result<SentimentStats> {
    if predictions.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let positive = predictions.iter().filter(|&&p| p == 1).count();
    let share = |count: usize| format!("{:.1} %", count as f64 * 100.0 / predictions.len() as f64);

    Ok(SentimentStats {
        negative: share(predictions.len() - positive),
        positive: share(positive),
    })
}

/// Predict the arg-max class of every item, in dataset order, with the class shares
pub fn evaluate_batch<B, M>(
    model: &M,
    dataset: EncodedDataset,
    batch_size: usize,
    device: &B::Device,
) -> Result<(Vec<u8>, SentimentStats)>
where
    B: Backend,
    M: Classifier<B>,
{
    if dataset.length() == 0 {
        return Err(Error::EmptyDataset);
    }

    if batch_size == 0 {
        return Err(Error::Config("batch size must be positive".into()));
    }

    // Single-threaded so batches arrive in dataset order
    let dataloader: Arc<dyn DataLoader<Infer<B>>> =
        DataLoaderBuilder::new(Batcher::<B>::new(device.clone()))
            .batch_size(batch_size)
            .build(dataset);

    let mut predictions = Vec::new();

    for batch in dataloader.iter() {
        let classes = model
            .logits(batch)
            .argmax(1)
            .into_data()
            .convert::<i64>()
            .value;

        predictions.extend(classes.into_iter().map(|class| class as u8));
    }

    let stats = summarize(&predictions)?;

    Ok((predictions, stats))
}

/// Normalize, encode and classify one review
pub fn evaluate_single<B, M>(
    model: &M,
    encoder: &Encoder,
    text: &str,
    id2label: &BTreeMap<usize, String>,
    device: &B::Device,
) -> Result<SinglePrediction>
where
    B: Backend,
    M: Classifier<B>,
{
    let encodings = encoder.encode(&[normalize(text)], 1)?;
    let item = EncodedDataset::new(encodings, None)?.item(0)?;

    let batch: Infer<B> = Batcher::<B>::new(device.clone()).batch(vec![item]);
    let probabilities = float_rows(softmax(model.logits(batch), 1))
        .into_iter()
        .next()
        .unwrap_or_default();

    let (predicted, _) = probabilities
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (class, &p)| {
            if p > best.1 {
                (class, p)
            } else {
                best
            }
        });

    let probabilities = probabilities
        .into_iter()
        .enumerate()
        .map(|(class, p)| Ok((label_for(id2label, class)?, p)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(SinglePrediction {
        probabilities,
        predicted_label: label_for(id2label, predicted)?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        pipelines::sentiment::testing::{self, FixedClassifier, TestBackend, DEVICE},
        utils::classes::id2label,
    };

    use super::*;

    const CLASSIFIER: FixedClassifier = FixedClassifier {
        positive: [-1.0, 1.0],
        negative: [2.0, 0.0],
    };

    fn unlabeled(texts: &[&str]) -> EncodedDataset {
        let encodings = testing::encoder(8).encode(texts, 3).unwrap();

        EncodedDataset::new(encodings, None).unwrap()
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&[1, 0, 1, 0, 0, 0, 1]).unwrap();

        assert_eq!(
            stats,
            SentimentStats {
                negative: "57.1 %".to_string(),
                positive: "42.9 %".to_string(),
            }
        );

        assert_eq!(summarize(&[1, 1]).unwrap().negative, "0.0 %");
        assert_eq!(summarize(&[1, 1]).unwrap().positive, "100.0 %");
    }

    #[test]
    fn test_summarize_empty() {
        assert!(matches!(summarize(&[]), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_stats_serialize_with_class_names() {
        let json = serde_json::to_value(summarize(&[0, 1]).unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "Negative": "50.0 %", "Positive": "50.0 %" })
        );
    }

    #[test]
    fn test_evaluate_batch_keeps_order_across_batches() {
        let (predictions, stats) = evaluate_batch::<TestBackend, _>(
            &CLASSIFIER,
            unlabeled(testing::TEXTS),
            3,
            &DEVICE,
        )
        .unwrap();

        assert_eq!(predictions, vec![1, 0, 1, 0, 0, 0, 1]);
        assert_eq!(stats.positive, "42.9 %");
    }

    #[test]
    fn test_evaluate_batch_empty() {
        let result = evaluate_batch::<TestBackend, _>(&CLASSIFIER, unlabeled(&[]), 3, &DEVICE);

        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_evaluate_single() {
        let encoder = testing::encoder(8);

        let prediction = evaluate_single::<TestBackend, _>(
            &CLASSIFIER,
            &encoder,
            "  Отличный магазин!!! 10/10 ",
            &id2label(),
            &DEVICE,
        )
        .unwrap();

        assert_eq!(prediction.predicted_label, "Positive");

        let total: f64 = prediction.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(prediction.probabilities["Positive"] > prediction.probabilities["Negative"]);
    }

    #[test]
    fn test_evaluate_single_negative() {
        let encoder = testing::encoder(8);

        let prediction = evaluate_single::<TestBackend, _>(
            &CLASSIFIER,
            &encoder,
            "Плохой товар",
            &id2label(),
            &DEVICE,
        )
        .unwrap();

        assert_eq!(prediction.predicted_label, "Negative");
    }
}
