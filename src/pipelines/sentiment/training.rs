use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    lr_scheduler::{
        linear::{LinearLrScheduler, LinearLrSchedulerConfig},
        LrScheduler,
    },
    module::AutodiffModule,
    optim::{AdamWConfig, Optimizer},
    tensor::{
        activation::softmax,
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
    train::{ClassificationOutput, ValidStep},
    LearningRate,
};
use log::{info, warn};

use crate::{
    datasets::table::TARGET_COLUMN,
    error::{Error, Result},
    utils::tensors::float_rows,
};

use super::{
    batcher::{Batcher, Train},
    metrics::{roc_auc, History, MetricsSnapshot},
    EncodedDataset, Model,
};

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct TrainingConfig {
    /// Pretrained model name on the Hugging Face Hub
    #[config(default = "\"cointegrated/rubert-tiny2\".to_string()")]
    pub model_name: String,

    /// Local directory holding the pretrained checkpoint, tried before the Hub
    #[config(default = "\"models/rubert-tiny2\".to_string()")]
    pub model_path: String,

    /// Directory to save the trained model, its config and tokenizer
    #[config(default = "\"models/sentiment\".to_string()")]
    pub artifact_dir: String,

    /// Where test-set metrics are written
    #[config(default = "\"report/metrics.json\".to_string()")]
    pub metrics_path: String,

    /// Where the per-epoch validation history is written
    #[config(default = "\"report/history.json\".to_string()")]
    pub history_path: String,

    /// Maximum sequence length
    #[config(default = 512)]
    pub max_seq_length: usize,

    /// Number of chunks texts are encoded in
    #[config(default = 10)]
    pub encode_chunks: usize,

    /// Batch size
    #[config(default = 8)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 3)]
    pub num_epochs: usize,

    /// Initial learning rate, decayed linearly to zero
    #[config(default = 2e-5)]
    pub learning_rate: LearningRate,

    /// AdamW weight decay
    #[config(default = 0.01)]
    pub weight_decay: f32,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Dropout rate
    #[config(default = 0.1)]
    pub hidden_dropout_prob: f64,

    /// Train the whole network rather than the classification head only
    #[config(default = true)]
    pub fine_tune_backbone: bool,

    /// Seed for shuffling and for the initial weights of the classification head
    #[config(default = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[config(default = 1)]
    pub num_workers: usize,
}

/// The outcome of a training run
pub struct TrainedModel<M> {
    /// The model after the last epoch
    pub model: M,

    /// Test-set metrics
    pub metrics: MetricsSnapshot,

    /// Validation ROC-AUC and loss per epoch
    pub history: History,
}

/// Predictions collected over a whole data loader
struct Evaluation {
    targets: Vec<u8>,
    probabilities: Vec<f64>,
    loss: f64,
}

/// Fine-tune `model`, validating once per epoch, then score the test set.
///
/// The metrics snapshot and the history replace whatever the previous run left at
/// `config.metrics_path` and `config.history_path`.
pub fn train<B, M>(
    config: &TrainingConfig,
    model: M,
    dataset_train: EncodedDataset,
    dataset_val: EncodedDataset,
    dataset_test: EncodedDataset,
    fine_tune_backbone: bool,
    device: &B::Device,
) -> Result<TrainedModel<M>>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    M::InnerModule: ValidStep<
        Train<<B as AutodiffBackend>::InnerBackend>,
        ClassificationOutput<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    for dataset in [&dataset_train, &dataset_val, &dataset_test] {
        if dataset.targets().is_none() {
            return Err(Error::MissingColumn(TARGET_COLUMN.to_string()));
        }
    }

    if dataset_train.length() == 0 {
        return Err(Error::EmptyDataset);
    }

    if config.batch_size == 0 {
        return Err(Error::Config("batch size must be positive".into()));
    }

    B::seed(config.seed);

    let mut model = if fine_tune_backbone {
        model
    } else {
        info!("Freezing backbone, only the classification head will be trained");
        model.freeze_backbone()
    };

    let steps_per_epoch = dataset_train.length().div_ceil(config.batch_size);
    let total_steps = (steps_per_epoch * config.num_epochs).max(1);

    // Initialize data loaders for training, validation and testing data
    let dataloader_train: Arc<dyn DataLoader<Train<B>>> =
        DataLoaderBuilder::new(Batcher::<B>::new(device.clone()))
            .batch_size(config.batch_size)
            .shuffle(config.seed)
            .num_workers(config.num_workers)
            .build(dataset_train);

    let dataloader_val: Arc<dyn DataLoader<Train<B::InnerBackend>>> =
        DataLoaderBuilder::new(Batcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(config.batch_size)
            .num_workers(config.num_workers)
            .build(dataset_val);

    let dataloader_test: Arc<dyn DataLoader<Train<B::InnerBackend>>> =
        DataLoaderBuilder::new(Batcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(config.batch_size)
            .num_workers(config.num_workers)
            .build(dataset_test);

    // Initialize optimizer
    let mut optimizer = AdamWConfig::new()
        .with_weight_decay(config.weight_decay)
        .with_epsilon(config.adam_epsilon)
        .init::<B, M>();

    // Initialize learning rate scheduler
    let mut lr_scheduler = lr_scheduler(config, total_steps)?;

    let mut history = History::default();

    for epoch in 1..=config.num_epochs {
        let mut train_loss = 0.0;
        let mut train_batches = 0;

        for batch in dataloader_train.iter() {
            let learning_rate = LrScheduler::<B>::step(&mut lr_scheduler);

            let output = model.step(batch);
            train_loss += output.item.loss.clone().into_scalar().elem::<f64>();
            train_batches += 1;

            model = optimizer.step(learning_rate, model, output.grads);
        }

        let evaluation = evaluate(&model.valid(), &dataloader_val);
        let auc = roc_auc(&evaluation.targets, &evaluation.probabilities);

        info!(
            "Epoch {}/{} | train_loss={:.4} | eval_loss={:.4} | eval_auc={}",
            epoch,
            config.num_epochs,
            mean(train_loss, train_batches),
            evaluation.loss,
            auc.map_or_else(|| "n/a".to_string(), |auc| format!("{auc:.4}")),
        );

        match auc {
            Some(auc) if evaluation.loss.is_finite() => history.push(auc, evaluation.loss),
            _ => warn!("Epoch {epoch}: validation set cannot be scored, skipping history entry"),
        }
    }

    let evaluation = evaluate(&model.valid(), &dataloader_test);
    let metrics = MetricsSnapshot::compute(&evaluation.targets, &evaluation.probabilities)?;

    info!("Test metrics: {:?}", metrics);

    metrics.save(&config.metrics_path)?;
    history.save(&config.history_path)?;

    Ok(TrainedModel {
        model,
        metrics,
        history,
    })
}

/// Linear decay from the configured learning rate to zero over every training step
fn lr_scheduler(config: &TrainingConfig, total_steps: usize) -> Result<LinearLrScheduler> {
    if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
        return Err(Error::Config(format!(
            "learning rate must be within (0, 1], got {}",
            config.learning_rate
        )));
    }

    Ok(LinearLrSchedulerConfig::new(config.learning_rate, 0.0, total_steps).init())
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        f64::NAN
    } else {
        total / count as f64
    }
}

/// Run a model over every batch, collecting positive-class probabilities and the mean loss
fn evaluate<B, M>(model: &M, dataloader: &Arc<dyn DataLoader<Train<B>>>) -> Evaluation
where
    B: Backend,
    M: ValidStep<Train<B>, ClassificationOutput<B>>,
{
    let mut targets = Vec::new();
    let mut probabilities = Vec::new();
    let mut loss = 0.0;
    let mut batches = 0;

    for batch in dataloader.iter() {
        let output = model.step(batch);

        loss += output.loss.into_scalar().elem::<f64>();
        batches += 1;

        probabilities.extend(
            float_rows(softmax(output.output, 1))
                .into_iter()
                .map(|row| row[1]),
        );
        targets.extend(
            output
                .targets
                .into_data()
                .convert::<i64>()
                .value
                .into_iter()
                .map(|t| t as u8),
        );
    }

    Evaluation {
        targets,
        probabilities,
        loss: mean(loss, batches),
    }
}
