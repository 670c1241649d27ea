// All core functionality is in deckwright-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod substitutions;

// Re-export core types for convenience
pub use deckwright_core::*;

// Re-export CLI utilities
pub use substitutions::{load_substitutions, parse_substitutions};
