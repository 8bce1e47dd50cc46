// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TranslationSample>
// into three padded Int tensors.
//
// Sentences differ in length, so padding happens here rather than
// in the dataset: every row is right-padded with <pad> (id 0) to
// the longest row of *this* batch. Short batches stay short.
//
//   source:        [N, S]   encoder input
//   decoder_input: [N, T]   <s> + target
//   labels:        [N, T]   target + </s>, <pad> ignored by the loss
//
// Decoder input and labels always have equal length per sample,
// so one T covers both.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationSample;
use crate::infra::tokenizer_store::PAD_ID;

// ─── TranslationBatch ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Encoder token ids, shape: [batch_size, src_len]
    pub source: Tensor<B, 2, Int>,

    /// Teacher-forced decoder ids, shape: [batch_size, tgt_len]
    pub decoder_input: Tensor<B, 2, Int>,

    /// Next-token targets, shape: [batch_size, tgt_len]
    pub labels: Tensor<B, 2, Int>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Flatten rows into one Vec<i32>, right-padding each to `width`.
fn pad_rows<'a>(rows: impl Iterator<Item = &'a Vec<u32>>, width: usize) -> Vec<i32> {
    let mut flat = Vec::new();
    for row in rows {
        flat.extend(row.iter().map(|&id| id as i32));
        flat.extend(std::iter::repeat(PAD_ID as i32).take(width - row.len()));
    }
    flat
}

impl<B: Backend> Batcher<TranslationSample, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationSample>) -> TranslationBatch<B> {
        let batch_size = items.len();
        let src_len = items.iter().map(|s| s.source_ids.len()).max().unwrap_or(1).max(1);
        let tgt_len = items.iter().map(|s| s.label_ids.len()).max().unwrap_or(1).max(1);

        let source_flat  = pad_rows(items.iter().map(|s| &s.source_ids), src_len);
        let decoder_flat = pad_rows(items.iter().map(|s| &s.decoder_input_ids), tgt_len);
        let labels_flat  = pad_rows(items.iter().map(|s| &s.label_ids), tgt_len);

        let source = Tensor::<B, 1, Int>::from_ints(
            source_flat.as_slice(), &self.device
        ).reshape([batch_size, src_len]);

        let decoder_input = Tensor::<B, 1, Int>::from_ints(
            decoder_flat.as_slice(), &self.device
        ).reshape([batch_size, tgt_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels_flat.as_slice(), &self.device
        ).reshape([batch_size, tgt_len]);

        TranslationBatch { source, decoder_input, labels }
    }
}
