// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here:
//
//   model.rs      - encoder-decoder transformer
//                   • shared token embedding for both languages
//                   • learned positional embedding
//                   • Burn TransformerEncoder / TransformerDecoder
//                   • vocabulary projection head
//
//   generator.rs  - length-normalised beam search, independent of
//                   Burn so it is testable with hand-made scores
//
//   trainer.rs    - epoch loop: teacher-forced cross-entropy,
//                   Adam, validation, best-checkpoint saving and
//                   early stopping
//
//   inferencer.rs - BurnEngine: loads a checkpoint and implements
//                   the TranslationEngine trait
//
// Backends:
//   NdArray (CPU) by default, so tests and small machines work
//   without a GPU. Build with `--features wgpu` to train and serve
//   on the GPU through WGPU. Training wraps the inference backend
//   in Autodiff.

use burn::prelude::Backend;

/// Encoder-decoder transformer architecture and presets
pub mod model;

/// Beam search decoding
pub mod generator;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Checkpoint-backed TranslationEngine
pub mod inferencer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub type Device = <InferBackend as Backend>::Device;

#[cfg(not(feature = "wgpu"))]
pub const BACKEND_NAME: &str = "ndarray";
#[cfg(feature = "wgpu")]
pub const BACKEND_NAME: &str = "wgpu";

pub fn default_device() -> Device {
    Device::default()
}
