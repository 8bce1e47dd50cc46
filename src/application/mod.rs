// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math (Layer 5), no
// argument parsing or HTTP (Layer 1), no file formats (Layers 4
// and 6).

/// The fine-tuning workflow
pub mod train_use_case;

/// The inference workflow behind the CLI and HTTP API
pub mod translate_use_case;
