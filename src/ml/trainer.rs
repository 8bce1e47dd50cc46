// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Teacher-forced cross-entropy training with Burn's DataLoader
// and Adam.
//
//   - Training runs on TrainBackend (Autodiff<InferBackend>)
//   - model.valid() drops autodiff for validation, so the
//     validation batcher is built on InferBackend
//   - Weights are saved only when validation loss improves; with
//     no validation set, after every epoch
//   - `patience` epochs in a row without improvement end the run
//
// Backend panics (allocation failures in particular) are caught
// at this boundary and reported as TranslatorError::Resource, so
// the CLI exits with a message instead of an abort trace.

use std::panic::{self, AssertUnwindSafe};

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::ElementConversion,
};

use crate::data::{batcher::TranslationBatcher, dataset::TranslationDataset};
use crate::domain::error::{Result, TranslatorError};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    model::{Seq2SeqModel, TokenStats},
    Device, InferBackend, TrainBackend,
};

#[derive(Debug, Clone, Copy)]
pub struct TrainerOptions {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    /// 0 disables early stopping
    pub patience:      usize,
    pub seed:          u64,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs_completed: usize,
    pub stopped_early:    bool,
    pub best_val_loss:    Option<f64>,
    pub history:          Vec<EpochMetrics>,
}

pub fn run_training(
    model:   Seq2SeqModel<TrainBackend>,
    opts:    TrainerOptions,
    train:   TranslationDataset,
    val:     TranslationDataset,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  Device,
) -> Result<TrainingReport> {
    tracing::info!("Using {} device: {:?}", crate::ml::BACKEND_NAME, device);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        train_loop(model, opts, train, val, ckpt, metrics, device)
    }));
    outcome.unwrap_or_else(|payload| Err(TranslatorError::Resource(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "backend panicked".to_string()
    }
}

fn train_loop(
    mut model: Seq2SeqModel<TrainBackend>,
    opts:      TrainerOptions,
    train:     TranslationDataset,
    val:       TranslationDataset,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
    device:    Device,
) -> Result<TrainingReport> {
    let has_validation = !val.is_empty();
    tracing::info!(
        "Training on {} samples, validating on {}",
        train.sample_count(),
        val.sample_count(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let train_loader = DataLoaderBuilder::new(TranslationBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(1)
        .build(train);

    let val_loader = DataLoaderBuilder::new(TranslationBatcher::<InferBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .num_workers(1)
        .build(val);

    let mut best_val_loss: Option<f64> = None;
    let mut stale_epochs  = 0usize;
    let mut history       = Vec::with_capacity(opts.epochs);
    let mut stopped_early = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=opts.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _, _) = model.forward_loss(batch.source, batch.decoder_input, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(TranslatorError::Resource(format!(
                    "training loss became {loss_val} at epoch {epoch}; lower training.learning_rate"
                )));
            }
            train_loss_sum += loss_val;
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.learning_rate, model, grads);
        }

        let train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let (val_loss, val_token_acc) = if has_validation {
            let model_valid = model.valid();
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;
            let mut stats    = TokenStats::default();

            for batch in val_loader.iter() {
                let (loss, logits, labels) =
                    model_valid.forward_loss(batch.source, batch.decoder_input, batch.labels);
                loss_sum += loss.into_scalar().elem::<f64>();
                batches  += 1;

                let batch_stats = Seq2SeqModel::token_stats(logits, labels);
                stats.correct += batch_stats.correct;
                stats.total   += batch_stats.total;
            }
            let acc = if stats.total > 0 { stats.correct as f64 / stats.total as f64 } else { 0.0 };
            (Some(loss_sum / batches.max(1) as f64), Some(acc))
        } else {
            (None, None)
        };

        let row = EpochMetrics { epoch, train_loss, val_loss, val_token_acc };
        metrics.log(&row)?;

        match (val_loss, val_token_acc) {
            (Some(vl), Some(acc)) => tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_token_acc={:.1}%",
                epoch, opts.epochs, train_loss, vl, acc * 100.0,
            ),
            _ => tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | no validation set",
                epoch, opts.epochs, train_loss,
            ),
        }

        // ── Checkpoint / early stopping ───────────────────────────────────────
        if row.is_improvement(best_val_loss) {
            if val_loss.is_some() {
                best_val_loss = val_loss;
            }
            stale_epochs = 0;
            ckpt.save_model(&model)?;
            tracing::info!("Checkpoint saved for epoch {}", epoch);
        } else {
            stale_epochs += 1;
            tracing::info!(
                "No validation improvement for {} epoch(s) (best {:.4})",
                stale_epochs,
                best_val_loss.unwrap_or(f64::NAN),
            );
        }
        history.push(row);

        if opts.patience > 0 && stale_epochs >= opts.patience {
            tracing::info!("Early stopping after epoch {}", epoch);
            stopped_early = true;
            break;
        }
    }

    tracing::info!("Training complete!");
    Ok(TrainingReport {
        epochs_completed: history.len(),
        stopped_early,
        best_val_loss,
        history,
    })
}
