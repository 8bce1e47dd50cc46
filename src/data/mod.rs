// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between parallel-corpus files on disk and padded
// tensor batches:
//
//   .json / .csv / .txt files
//       │
//       ▼
//   DirectoryLoader   → reads files, yields TranslationPairs
//       │
//       ▼
//   Preprocessor      → cleans text, drops short/long/duplicate pairs
//       │
//       ▼
//   splitter          → seeded train / validation split
//       │
//       ▼
//   TranslationDataset → tokenised samples (Burn Dataset)
//       │
//       ▼
//   TranslationBatcher → padded Int tensors (Burn Batcher)

/// Reads JSON, CSV and tab/pipe separated corpus files
pub mod loader;

/// Cleans text and filters sentence pairs
pub mod preprocessor;

/// Built-in NGO sample corpus
pub mod sample;

/// Implements Burn's Dataset trait for tokenised pairs
pub mod dataset;

/// Implements Burn's Batcher trait with per-batch padding
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
