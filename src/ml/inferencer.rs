// ============================================================
// Layer 5 — Inferencer
// ============================================================
use std::{path::Path, sync::Mutex};

use burn::{prelude::*, tensor::activation::log_softmax};

use crate::domain::{
    error::{Result, TranslatorError},
    language::Language,
    traits::{DecodingParams, ModelInfo, TranslationEngine},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{PairTokenizer, TokenizerStore},
};
use crate::ml::{
    generator::BeamSearch,
    model::{EncodedSource, Seq2SeqModel},
    Device, InferBackend, BACKEND_NAME,
};

/// A trained checkpoint behind the `TranslationEngine` trait.
///
/// Burn modules are `Send` but not `Sync`, so the model sits
/// behind a mutex; each request clones it (parameters are
/// reference counted) and decodes without holding the lock.
pub struct BurnEngine {
    model:      Mutex<Seq2SeqModel<InferBackend>>,
    tokenizer:  PairTokenizer,
    device:     Device,
    max_length: usize,
    info:       ModelInfo,
}

impl BurnEngine {
    pub fn load(dir: &Path) -> Result<Self> {
        let device = crate::ml::default_device();
        let ckpt   = CheckpointManager::open(dir)?;
        let cfg    = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(dir).load()?;

        if tokenizer.vocab_size() != cfg.architecture.vocab_size {
            return Err(TranslatorError::model_load(
                dir,
                format!(
                    "tokenizer has {} entries but the model expects {}",
                    tokenizer.vocab_size(),
                    cfg.architecture.vocab_size
                ),
            ));
        }

        let model = cfg.architecture.clone().with_dropout(0.0).init::<InferBackend>(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", dir.display());

        let info = ModelInfo {
            checkpoint:          dir.display().to_string(),
            base_model:          Some(cfg.base_model.clone()),
            backend:             BACKEND_NAME.to_string(),
            vocab_size:          cfg.architecture.vocab_size,
            d_model:             cfg.architecture.d_model,
            num_layers:          cfg.architecture.num_layers,
            num_heads:           cfg.architecture.num_heads,
            max_length:          cfg.max_length,
            supported_languages: Language::ALL.to_vec(),
        };

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            max_length: cfg.max_length,
            info,
        })
    }

    fn snapshot(&self) -> Result<Seq2SeqModel<InferBackend>> {
        self.model
            .lock()
            .map(|m| m.clone())
            .map_err(|_| TranslatorError::Inference("model lock poisoned".into()))
    }

    /// Log-probabilities of the next token for every prefix.
    fn score_prefixes(
        &self,
        model:    &Seq2SeqModel<InferBackend>,
        encoded:  &EncodedSource<InferBackend>,
        prefixes: &[Vec<u32>],
    ) -> Result<Vec<Vec<f32>>> {
        let rows = prefixes.len();
        // All beams advance together, so prefixes share one length
        let width = prefixes[0].len();
        let flat: Vec<i32> = prefixes.iter().flat_map(|p| p.iter().map(|&id| id as i32)).collect();
        let decoder_input = Tensor::<InferBackend, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([rows, width]);

        let logits = model.decode(decoder_input, &encoded.repeat_rows(rows));
        let [_, _, vocab] = logits.dims();
        let last = logits
            .slice([0..rows, width - 1..width, 0..vocab])
            .reshape([rows, vocab]);

        let scores: Vec<f32> = log_softmax(last, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| TranslatorError::Inference(format!("cannot read decoder output: {e:?}")))?;
        Ok(scores.chunks(vocab).map(|c| c.to_vec()).collect())
    }
}

impl TranslationEngine for BurnEngine {
    fn generate(&self, text: &str, target: Language, params: &DecodingParams) -> Result<String> {
        let source_ids = self.tokenizer.encode_source(text, target, self.max_length)?;
        let model = self.snapshot()?;

        let source_flat: Vec<i32> = source_ids.iter().map(|&id| id as i32).collect();
        let source = Tensor::<InferBackend, 1, Int>::from_ints(source_flat.as_slice(), &self.device)
            .reshape([1, source_flat.len()]);
        let encoded = model.encode(source);

        // Decoder input is <s> plus generated tokens, bounded by the
        // position table the checkpoint was trained with
        let max_steps = params.max_length.min(model.max_positions);
        let search = BeamSearch::new(params.beam_size, max_steps, params.length_penalty);
        let ids = search.search(|prefixes| self.score_prefixes(&model, &encoded, prefixes))?;

        let text = self.tokenizer.decode(&ids)?;
        tracing::debug!("Generated {} tokens → '{}'", ids.len(), text);
        Ok(text)
    }

    fn info(&self) -> ModelInfo {
        self.info.clone()
    }
}
