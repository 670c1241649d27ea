// Preprocessor abstraction for package import
//
// This module defines the boundary between container handling (zip -> parts)
// and document construction (parts -> slides, theme, components). Everything
// after this point works with a Document and is container-agnostic.

use crate::error::{ImportError, ImportWarning};
use crate::package::archive::RawPackage;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of importing one package: the document plus what had to be recovered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedPackage {
    pub document: Document,
    #[serde(default)]
    pub warnings: Vec<ImportWarning>,
}

/// Preprocessor trait - converts package bytes into a Document
///
/// The preprocessing happens in two clear steps:
/// 1. Package bytes -> raw parts (container handling)
/// 2. Raw parts -> ParsedPackage (slides, theme, components)
pub trait Preprocessor {
    /// Step 1: Open the container and read every part
    fn read_package(&self, bytes: &[u8]) -> Result<RawPackage, ImportError>;

    /// Step 2: Build the document from the parts.
    /// Unreadable individual parts are recovered as warnings, never errors.
    fn build_document(&self, package: &RawPackage) -> Result<ParsedPackage, ImportError>;

    /// Full package processing (combines both steps)
    fn process(&self, bytes: &[u8]) -> Result<ParsedPackage, ImportError> {
        let package = self.read_package(bytes)?;
        self.build_document(&package)
    }

    /// Reads the file and processes the bytes
    fn process_file(&self, input: &Path) -> Result<ParsedPackage, ImportError> {
        let bytes = std::fs::read(input)?;
        self.process(&bytes)
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
