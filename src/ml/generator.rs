// ============================================================
// Layer 5 — Beam Search
// ============================================================
// Length-normalised beam search over an arbitrary scoring step.
//
// The search only sees prefixes and log-probability rows, so the
// same code drives the Burn decoder at runtime and hand-written
// score tables in the tests below.
//
// Ranking:
//   score(h) = Σ log p(token) / len(h) ^ length_penalty
//
// where len counts generated tokens including </s>. A penalty of
// 0.0 ranks by raw log-probability, 1.0 by mean per-token score.
//
// Output constraints:
//   - </s> may not be chosen at the first step, and control ids
//     (<pad>, <unk>, <s>, language tags) are never chosen, so a
//     finished hypothesis always carries at least one word
//   - at most `max_steps` tokens are generated; beams still alive
//     at the limit are ranked like finished ones

use crate::domain::error::{Result, TranslatorError};
use crate::infra::tokenizer_store::{is_control_token, BOS_ID, EOS_ID};

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens:    Vec<u32>,
    log_prob:  f32,
}

impl Hypothesis {
    /// Generated tokens so far, excluding the leading <s>
    fn generated(&self) -> usize {
        self.tokens.len() - 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BeamSearch {
    pub beam_size:      usize,
    pub max_steps:      usize,
    pub length_penalty: f32,
}

impl BeamSearch {
    pub fn new(beam_size: usize, max_steps: usize, length_penalty: f32) -> Self {
        Self {
            beam_size: beam_size.max(1),
            max_steps: max_steps.max(1),
            length_penalty,
        }
    }

    fn normalised(&self, log_prob: f32, len: usize) -> f32 {
        log_prob / (len.max(1) as f32).powf(self.length_penalty)
    }

    /// Run the search. `step` receives every live prefix (each
    /// starting with <s>) and returns one log-probability row over
    /// the vocabulary per prefix, in the same order.
    ///
    /// Returns the best hypothesis without <s> and </s>.
    pub fn search<F>(&self, mut step: F) -> Result<Vec<u32>>
    where
        F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>>,
    {
        let mut beams = vec![Hypothesis { tokens: vec![BOS_ID], log_prob: 0.0 }];
        // (tokens without <s>/<\s>, normalised score)
        let mut finished: Vec<(Vec<u32>, f32)> = Vec::new();

        for position in 0..self.max_steps {
            let prefixes: Vec<Vec<u32>> = beams.iter().map(|h| h.tokens.clone()).collect();
            let rows = step(&prefixes)?;
            if rows.len() != beams.len() {
                return Err(TranslatorError::Inference(format!(
                    "scorer returned {} rows for {} hypotheses",
                    rows.len(),
                    beams.len()
                )));
            }

            // ── Expand: best `beam_size` continuations of every beam ─────────
            let mut candidates: Vec<(usize, u32, f32)> = Vec::new();
            for (beam_idx, (beam, row)) in beams.iter().zip(&rows).enumerate() {
                let mut allowed: Vec<(u32, f32)> = row
                    .iter()
                    .enumerate()
                    .map(|(id, &lp)| (id as u32, lp))
                    .filter(|&(id, lp)| {
                        !is_control_token(id) && !(position == 0 && id == EOS_ID) && lp.is_finite()
                    })
                    .collect();
                allowed.sort_by(|a, b| b.1.total_cmp(&a.1));
                allowed.truncate(self.beam_size);
                candidates.extend(
                    allowed.into_iter().map(|(id, lp)| (beam_idx, id, beam.log_prob + lp)),
                );
            }
            if candidates.is_empty() {
                break;
            }
            candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

            // ── Select: </s> finishes a hypothesis, anything else extends ────
            let mut next = Vec::with_capacity(self.beam_size);
            for (beam_idx, id, log_prob) in candidates {
                let parent = &beams[beam_idx];
                if id == EOS_ID {
                    let words = parent.tokens[1..].to_vec();
                    let score = self.normalised(log_prob, parent.generated() + 1);
                    finished.push((words, score));
                } else {
                    let mut tokens = parent.tokens.clone();
                    tokens.push(id);
                    next.push(Hypothesis { tokens, log_prob });
                }
                if next.len() == self.beam_size {
                    break;
                }
            }
            beams = next;

            // Enough finished hypotheses, and none of the live ones
            // can still overtake the best finished one
            if finished.len() >= self.beam_size || beams.is_empty() {
                let best_done  = finished.iter().map(|f| f.1).fold(f32::NEG_INFINITY, f32::max);
                let best_alive = beams
                    .iter()
                    .map(|h| self.normalised(h.log_prob, h.generated()))
                    .fold(f32::NEG_INFINITY, f32::max);
                if best_done >= best_alive {
                    break;
                }
            }
        }

        // Beams that hit the step limit compete on equal terms
        for h in &beams {
            finished.push((h.tokens[1..].to_vec(), self.normalised(h.log_prob, h.generated())));
        }

        finished
            .into_iter()
            .filter(|(words, _)| !words.is_empty())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(words, _)| words)
            .ok_or_else(|| TranslatorError::Inference("vocabulary has no generatable tokens".into()))
    }
}
