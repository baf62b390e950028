//! End-to-end training and prediction over files on disk

use std::{io::Read, path::Path};

use burn::tensor::backend::{AutodiffBackend, Backend};
use log::info;

use crate::{
    datasets::{binarize, split, table, Labels, Table},
    error::Result,
    models::bert::sequence_classification as bert,
    settings::{Preprocessing, Settings},
    text::validate_review_text,
    utils::hugging_face::resolve_pretrained,
};

use super::{
    evaluate_batch, evaluate_single, train, EncodedDataset, Encoder, MetricsSnapshot,
    SentimentStats, SinglePrediction,
};

/// Tables ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splits {
    /// Training partition
    pub train: Table,

    /// Validation partition, carved out of the training partition
    pub val: Table,

    /// Test partition
    pub test: Table,
}

/// Binarize the raw ratings, hold out the test partition and persist both partitions
pub fn prepare_splits(preprocessing: &Preprocessing) -> Result<()> {
    let data = binarize(table::load(&preprocessing.raw_path)?)?;

    let (train, test) = split(&data, preprocessing.test_size, preprocessing.random_state)?;

    info!(
        "Split {} reviews into {} train and {} test",
        data.len(),
        train.len(),
        test.len()
    );

    train.save(&preprocessing.train_path)?;
    test.save(&preprocessing.test_path)?;

    Ok(())
}

/// Reload the persisted partitions, normalize them and hold out validation from training
pub fn load_splits(preprocessing: &Preprocessing) -> Result<Splits> {
    let train = table::load(&preprocessing.train_path)?
        .normalize()
        .drop_empty();
    let test = table::load(&preprocessing.test_path)?
        .normalize()
        .drop_empty();

    let (train, val) = split(&train, preprocessing.test_size, preprocessing.random_state)?;

    Ok(Splits { train, val, test })
}

/// Encode the texts of a table, keeping its targets if it has any
pub fn encode_table(encoder: &Encoder, table: &Table, chunks: usize) -> Result<EncodedDataset> {
    let encodings = encoder.encode(&table.texts, chunks)?;

    let targets = match &table.labels {
        Labels::Target(targets) => Some(targets.clone()),
        _ => None,
    };

    EncodedDataset::new(encodings, targets)
}

/// Run the full training pipeline: split the raw data, fine-tune the pretrained checkpoint and
/// persist the trained model, its test metrics and the validation history
pub async fn run_training<B: AutodiffBackend>(
    settings: &Settings,
    device: &B::Device,
) -> Result<MetricsSnapshot> {
    let config = &settings.train;

    let files = resolve_pretrained(&config.model_path, &config.model_name).await?;
    let (model, model_config) = bert::load_pretrained::<B>(
        &files,
        config.max_seq_length,
        config.hidden_dropout_prob,
        config.seed,
        device,
    )?;

    let max_length = model_config.max_seq_len.unwrap_or(config.max_seq_length);
    let encoder = Encoder::from_file(&files.tokenizer, max_length)?;

    prepare_splits(&settings.preprocessing)?;
    let splits = load_splits(&settings.preprocessing)?;

    info!(
        "Encoding {} train, {} validation and {} test reviews",
        splits.train.len(),
        splits.val.len(),
        splits.test.len()
    );

    let dataset_train = encode_table(&encoder, &splits.train, config.encode_chunks)?;
    let dataset_val = encode_table(&encoder, &splits.val, config.encode_chunks)?;
    let dataset_test = encode_table(&encoder, &splits.test, config.encode_chunks)?;

    let trained = train::<B, bert::Model<B>>(
        config,
        model,
        dataset_train,
        dataset_val,
        dataset_test,
        config.fine_tune_backbone,
        device,
    )?;

    bert::save(
        trained.model,
        &model_config,
        encoder.tokenizer(),
        &config.artifact_dir,
    )?;

    Ok(trained.metrics)
}

/// A trained classifier loaded for inference
pub struct Predictor<B: Backend> {
    model: bert::Model<B>,
    config: bert::Config,
    encoder: Encoder,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Load the model, config and tokenizer saved in `artifact_dir`
    pub fn load(artifact_dir: &str, max_seq_length: usize, device: B::Device) -> Result<Self> {
        let (model, config, tokenizer) = bert::load_trained::<B>(artifact_dir, &device)?;

        let max_length = config.max_seq_len.unwrap_or(max_seq_length);
        let encoder = Encoder::new(tokenizer, max_length)?;

        info!("Loaded trained model from {}", artifact_dir);

        Ok(Self {
            model,
            config,
            encoder,
            device,
        })
    }

    /// Load the trained model the settings point to
    pub fn from_settings(settings: &Settings, device: B::Device) -> Result<Self> {
        Self::load(settings.artifact_dir(), settings.train.max_seq_length, device)
    }

    /// Predict every row of a table, in order. Labels, if any, are ignored.
    pub fn predict_table(
        &self,
        table: Table,
        batch_size: usize,
        chunks: usize,
    ) -> Result<(Vec<u8>, SentimentStats)> {
        let table = table.normalize();
        let encodings = self.encoder.encode(&table.texts, chunks)?;
        let dataset = EncodedDataset::new(encodings, None)?;

        evaluate_batch(&self.model, dataset, batch_size, &self.device)
    }

    /// Predict every row of a CSV file
    pub fn predict_file<P: AsRef<Path>>(
        &self,
        path: P,
        batch_size: usize,
        chunks: usize,
    ) -> Result<(Vec<u8>, SentimentStats)> {
        self.predict_table(table::load_all(path)?, batch_size, chunks)
    }

    /// Predict every row of CSV data read from an upload
    pub fn predict_reader<R: Read>(
        &self,
        reader: R,
        batch_size: usize,
        chunks: usize,
    ) -> Result<(Vec<u8>, SentimentStats)> {
        self.predict_table(table::read_all(reader)?, batch_size, chunks)
    }

    /// Validate and classify a single review
    pub fn predict_text(&self, text: &str) -> Result<SinglePrediction> {
        validate_review_text(text)?;

        evaluate_single(
            &self.model,
            &self.encoder,
            text,
            &self.config.id2label,
            &self.device,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        error::Error,
        pipelines::sentiment::testing::{self, TestBackend, DEVICE},
    };

    use super::*;

    fn ratings_csv(rows: usize) -> String {
        let mut csv = String::from("text,rating\n");
        for i in 0..rows {
            let rating = if i % 10 < 7 { 5 } else { 2 };
            csv.push_str(&format!("Отзыв номер {} хороший? {},{}\n", i, "а".repeat(i + 1), rating));
        }
        csv
    }

    fn preprocessing(dir: &Path) -> Preprocessing {
        Preprocessing {
            raw_path: dir.join("raw.csv").display().to_string(),
            train_path: dir.join("processed").join("train.csv").display().to_string(),
            test_path: dir.join("processed").join("test.csv").display().to_string(),
            scrape_path: dir.join("scraped.csv").display().to_string(),
            test_size: 0.2,
            random_state: 10,
        }
    }

    #[test]
    fn test_prepare_and_load_splits() {
        let dir = tempfile::tempdir().unwrap();
        let preprocessing = preprocessing(dir.path());
        std::fs::write(&preprocessing.raw_path, ratings_csv(100)).unwrap();

        prepare_splits(&preprocessing).unwrap();

        let train = table::load(&preprocessing.train_path).unwrap();
        let test = table::load(&preprocessing.test_path).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.targets().unwrap().iter().filter(|&&t| t == 1).count(), 14);

        let splits = load_splits(&preprocessing).unwrap();
        assert_eq!(splits.train.len() + splits.val.len(), 80);
        assert_eq!(splits.val.len(), 16);
        assert_eq!(splits.test.len(), 20);
        assert!(splits.train.texts.iter().all(|text| text.starts_with("отзыв номер")));
    }

    #[test]
    fn test_prepare_splits_requires_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let preprocessing = preprocessing(dir.path());
        std::fs::write(&preprocessing.raw_path, "reviewText\nхорошо\nплохо\n").unwrap();

        assert!(matches!(
            prepare_splits(&preprocessing),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn test_encode_table_keeps_targets() {
        let table = Table::new(
            vec!["хороший товар".into(), "плохой товар".into()],
            Labels::Target(vec![1, 0]),
        )
        .unwrap();

        let dataset = encode_table(&testing::encoder(6), &table, 1).unwrap();

        assert_eq!(dataset.length(), 2);
        assert_eq!(dataset.targets(), Some(&[1, 0][..]));

        let unlabeled = encode_table(&testing::encoder(6), &Table::unlabeled(table.texts), 1).unwrap();
        assert_eq!(unlabeled.targets(), None);
    }

    fn predictor(dir: &Path) -> Predictor<TestBackend> {
        let artifact_dir = dir.display().to_string();
        let config = testing::tiny_bert();

        bert::save(
            config.init::<TestBackend>(&DEVICE),
            &config,
            &testing::tokenizer(),
            &artifact_dir,
        )
        .unwrap();

        Predictor::load(&artifact_dir, 512, DEVICE).unwrap()
    }

    #[test]
    fn test_predictor_uses_saved_sequence_length() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = predictor(dir.path());

        assert_eq!(predictor.encoder.max_length(), 8);
    }

    #[test]
    fn test_predict_reader() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = predictor(dir.path());

        let csv = "reviewText,label\nХороший товар!,5\nПлохой товар,1\nОтличный магазин,4\nПлохой товар,1\n";
        let (predictions, stats) = predictor.predict_reader(csv.as_bytes(), 2, 1).unwrap();

        // One prediction per input row, repeated reviews included
        assert_eq!(predictions.len(), 4);
        assert_eq!(predictions[1], predictions[3]);
        assert!(predictions.iter().all(|&p| p <= 1));

        let total: f64 = [&stats.negative, &stats.positive]
            .iter()
            .map(|share| share.trim_end_matches(" %").parse::<f64>().unwrap())
            .sum();
        assert!((total - 100.0).abs() < 0.11);
    }

    #[test]
    fn test_predict_reader_empty() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = predictor(dir.path());

        let result = predictor.predict_reader("reviewText\n".as_bytes(), 2, 1);

        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_predict_text() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = predictor(dir.path());

        let prediction = predictor.predict_text("Плохой товар").unwrap();

        assert_eq!(prediction.probabilities.len(), 2);
        assert!(["Negative", "Positive"].contains(&prediction.predicted_label.as_str()));

        assert!(matches!(
            predictor.predict_text("123"),
            Err(Error::Validation(_))
        ));
    }
}
