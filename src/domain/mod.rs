// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define what the translator works with:
// languages, parallel sentence pairs, the error taxonomy and the
// engine abstraction the inference service depends on.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Keeping it framework-free means the HTTP layer and the service
// object can be tested against a mock engine without a model.

// Supported language tags (en / ha)
pub mod language;

// A validated English/Hausa sentence pair
pub mod translation_pair;

// The crate-wide error type
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
