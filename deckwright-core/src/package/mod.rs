//! Package import
//!
//! ```text
//! .pptx bytes
//!     ↓
//! [archive]  zip container -> named parts
//!     ↓
//! [text / shapes / charts / theme]  per-part extraction
//!     ↓
//! [parser]  PackageParser -> Document (+ recovered warnings)
//! ```

pub mod archive;
pub mod charts;
pub mod parser;
pub mod preprocessor;
pub mod shapes;
pub mod text;
pub mod theme;

pub use archive::RawPackage;
pub use parser::PackageParser;
pub use preprocessor::{ParsedPackage, Preprocessor};
