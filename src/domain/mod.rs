// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Pure Rust structs, enums and traits describing the task:
// rows, labels, submissions, the majority vote, and the
// tracker abstraction.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, functions and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The three NLI classes
pub mod label;

// One premise/hypothesis example
pub mod nli_pair;

// Row id → predicted class tables
pub mod submission;

// Majority vote across fold submissions
pub mod vote;

// Core abstractions (traits) that other layers implement
pub mod traits;
