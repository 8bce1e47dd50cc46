use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::{error::Result, translation_pair::TranslationPair};
use crate::infra::tokenizer_store::PairTokenizer;

/// One tokenised sentence pair. Sequences are unpadded here;
/// the batcher pads each mini-batch to its longest row.
///
/// source_ids:        <2xx> source words </s>
/// decoder_input_ids: <s> target words
/// label_ids:         target words </s>
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationSample {
    pub source_ids:        Vec<u32>,
    pub decoder_input_ids: Vec<u32>,
    pub label_ids:         Vec<u32>,
}

impl TranslationSample {
    pub fn encode(pair: &TranslationPair, tokenizer: &PairTokenizer, max_len: usize) -> Result<Self> {
        let source_ids = tokenizer.encode_source(pair.source_text(), pair.target_lang(), max_len)?;
        let (decoder_input_ids, label_ids) = tokenizer.encode_target(pair.target_text(), max_len)?;
        Ok(Self { source_ids, decoder_input_ids, label_ids })
    }
}

pub struct TranslationDataset {
    samples: Vec<TranslationSample>,
}

impl TranslationDataset {
    pub fn new(samples: Vec<TranslationSample>) -> Self { Self { samples } }

    pub fn from_pairs(pairs: &[TranslationPair], tokenizer: &PairTokenizer, max_len: usize) -> Result<Self> {
        let samples = pairs
            .iter()
            .map(|p| TranslationSample::encode(p, tokenizer, max_len))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(samples))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
}

impl Dataset<TranslationSample> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
