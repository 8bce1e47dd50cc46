// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by more than one layer:
//
//   config.rs          - YAML configuration (training, serving, CLI)
//
//   checkpoint.rs      - Checkpoint directory layout
//                        Weights through Burn's CompactRecorder,
//                        architecture and run summary as JSON,
//                        and the single-writer lock file.
//
//   tokenizer_store.rs - Shared English+Hausa vocabulary
//                        Built from the training corpus on a
//                        fresh run, loaded back for inference and
//                        warm starts so ids never drift.
//
//   metrics.rs         - Per-epoch metrics CSV

/// YAML application configuration
pub mod config;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
