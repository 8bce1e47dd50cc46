use burn::{
    nn::{
        attention::generate_autoregressive_mask,
        loss::CrossEntropyLossConfig,
        transformer::{
            TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput,
            TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput,
        },
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::ElementConversion,
};

use crate::infra::tokenizer_store::PAD_ID;

/// Architecture presets accepted as `model.base_model`.
pub const PRESETS: [&str; 3] = ["seq2seq-tiny", "seq2seq-small", "seq2seq-base"];

/// Build the config for a named preset, or `None` if the name is unknown.
pub fn preset(name: &str, vocab_size: usize, max_positions: usize) -> Option<Seq2SeqConfig> {
    //                                   d_model heads layers d_ff
    let (d_model, num_heads, num_layers, d_ff) = match name {
        "seq2seq-tiny"  => (64,  2, 1, 128),
        "seq2seq-small" => (256, 4, 3, 1024),
        "seq2seq-base"  => (512, 8, 6, 2048),
        _ => return None,
    };
    Some(Seq2SeqConfig::new(vocab_size, max_positions, d_model, num_heads, num_layers, d_ff))
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:    usize,
    /// Longest sequence either side can hold
    pub max_positions: usize,
    pub d_model:       usize,
    pub num_heads:     usize,
    /// Layers in the encoder and, separately, in the decoder
    pub num_layers:    usize,
    pub d_ff:          usize,
    #[config(default = 0.1)]
    pub dropout:       f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_positions, self.d_model).init(device);
        let encoder = TransformerEncoderConfig::new(self.d_model, self.d_ff, self.num_heads, self.num_layers)
            .with_dropout(self.dropout)
            .with_norm_first(true)
            .init(device);
        let decoder = TransformerDecoderConfig::new(self.d_model, self.d_ff, self.num_heads, self.num_layers)
            .with_dropout(self.dropout)
            .with_norm_first(true)
            .init(device);
        let lm_head = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        Seq2SeqModel {
            token_embedding, position_embedding, encoder, decoder, lm_head, dropout,
            max_positions: self.max_positions,
        }
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub encoder:            TransformerEncoder<B>,
    pub decoder:            TransformerDecoder<B>,
    pub lm_head:            Linear<B>,
    pub dropout:            Dropout,
    pub max_positions:      usize,
}

/// Encoder output plus the source padding mask the decoder's
/// cross-attention must respect.
#[derive(Debug, Clone)]
pub struct EncodedSource<B: Backend> {
    pub memory:   Tensor<B, 3>,
    pub pad_mask: Tensor<B, 2, Bool>,
}

impl<B: Backend> EncodedSource<B> {
    /// Repeat a single encoded sentence for `n` beam hypotheses.
    pub fn repeat_rows(&self, n: usize) -> Self {
        Self {
            memory:   Tensor::cat(vec![self.memory.clone(); n], 0),
            pad_mask: Tensor::cat(vec![self.pad_mask.clone(); n], 0),
        }
    }
}

/// Teacher-forced next-token accuracy counts over non-pad labels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TokenStats {
    pub correct: usize,
    pub total:   usize,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// Token + position embeddings: [batch, len] → [batch, len, d_model]
    fn embed(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = self.token_embedding.forward(ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);
        self.dropout.forward(tok_emb + pos_emb)
    }

    /// Shapes of the vocabulary- and position-sized weights.
    /// Two models disagreeing here cannot share a record.
    pub fn weight_shapes(&self) -> [(&'static str, [usize; 2]); 3] {
        [
            ("token_embedding",    self.token_embedding.weight.val().dims()),
            ("position_embedding", self.position_embedding.weight.val().dims()),
            ("lm_head",            self.lm_head.weight.val().dims()),
        ]
    }

    pub fn encode(&self, source: Tensor<B, 2, Int>) -> EncodedSource<B> {
        let pad_mask = source.clone().equal_elem(PAD_ID as i32);
        let x = self.embed(source);
        let memory = self.encoder.forward(TransformerEncoderInput::new(x).mask_pad(pad_mask.clone()));
        EncodedSource { memory, pad_mask }
    }

    /// decoder_input: [batch, tgt_len] → logits [batch, tgt_len, vocab]
    pub fn decode(&self, decoder_input: Tensor<B, 2, Int>, source: &EncodedSource<B>) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = decoder_input.dims();
        let device = decoder_input.device();
        let target_pad = decoder_input.clone().equal_elem(PAD_ID as i32);
        let causal = generate_autoregressive_mask::<B>(batch_size, tgt_len, &device);

        let x = self.embed(decoder_input);
        let input = TransformerDecoderInput::new(x, source.memory.clone())
            .target_mask_attn(causal)
            .target_mask_pad(target_pad)
            .memory_mask_pad(source.pad_mask.clone());
        self.lm_head.forward(self.decoder.forward(input))
    }

    pub fn forward(&self, source: Tensor<B, 2, Int>, decoder_input: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let encoded = self.encode(source);
        self.decode(decoder_input, &encoded)
    }

    /// Mean cross-entropy over non-pad label positions.
    pub fn forward_loss(
        &self,
        source:        Tensor<B, 2, Int>,
        decoder_input: Tensor<B, 2, Int>,
        labels:        Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>, Tensor<B, 1, Int>) {
        let logits = self.forward(source, decoder_input);
        let [batch_size, tgt_len, vocab] = logits.dims();

        let logits = logits.reshape([batch_size * tgt_len, vocab]);
        let labels = labels.reshape([batch_size * tgt_len]);

        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![PAD_ID as usize]))
            .init(&logits.device());
        let loss = ce.forward(logits.clone(), labels.clone());
        (loss, logits, labels)
    }

    /// Count argmax predictions matching labels, ignoring padding.
    pub fn token_stats(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> TokenStats {
        let predictions = logits.argmax(1).flatten::<1>(0, 1);
        let real = labels.clone().equal_elem(PAD_ID as i32).bool_not().int();

        let correct: i64 = predictions
            .equal(labels)
            .int()
            .mul(real.clone())
            .sum()
            .into_scalar()
            .elem::<i64>();
        let total: i64 = real.sum().into_scalar().elem::<i64>();
        TokenStats { correct: correct as usize, total: total as usize }
    }
}
