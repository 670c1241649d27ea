pub mod categorizer;
pub mod variables;

pub use categorizer::SlideCategorizer;
pub use variables::{infer_type, VariableDetector, VariableMatch};
