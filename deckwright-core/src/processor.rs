use crate::cache::{ImportCacheKey, ImportCacheValue};
use crate::config::{CanvasConfig, DetectionConfig, EngineConfig, ParserConfig};
use crate::detection::{SlideCategorizer, VariableDetector};
use crate::error::ImportWarning;
use crate::export::{ExportReport, PackageExporter};
use crate::model::DocumentModel;
use crate::package::{PackageParser, ParsedPackage, Preprocessor};
use crate::storage::{
    calculate_config_hash, calculate_package_hash, DocumentStorage, FileStorage, NoOpStorage,
};
use crate::types::*;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        tracing::info!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "step finished");

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            tracing::info!(
                step = step.as_str(),
                elapsed_ms = duration.as_millis() as u64,
                share = %format!("{percentage:.1}%"),
                "profile"
            );
        }
        tracing::info!(total_ms = total.as_millis() as u64, "profile total");
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub profile: bool,
    pub skip_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub document: Document,
    pub warnings: Vec<ImportWarning>,
    /// Served from the import cache
    pub cached: bool,
}

/// The slice of configuration that changes what an import produces
#[derive(Serialize)]
struct ImportSettings<'a> {
    preprocessor: &'a str,
    parser: &'a ParserConfig,
    detection: &'a DetectionConfig,
    canvas: &'a CanvasConfig,
}

pub struct DocumentProcessor {
    preprocessor: Box<dyn Preprocessor>,
    storage: Box<dyn DocumentStorage + Send + Sync>,
    categorizer: SlideCategorizer,
}

impl DocumentProcessor {
    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(
        preprocessor: Box<dyn Preprocessor>,
        storage: Box<dyn DocumentStorage + Send + Sync>,
    ) -> Self {
        Self {
            preprocessor,
            storage,
            categorizer: SlideCategorizer::new(),
        }
    }

    /// Package parser built from `config`, caching under `cache_dir` when given
    pub fn new_cli(config: &EngineConfig, cache_dir: Option<&str>) -> Result<Self> {
        let preprocessor = Box::new(PackageParser::new(
            config.parser.clone(),
            config.canvas.extent(),
        ));
        let storage: Box<dyn DocumentStorage + Send + Sync> = match cache_dir {
            Some(dir) => Box::new(FileStorage::new(dir)?),
            None => Box::new(NoOpStorage::new()),
        };
        Ok(Self::new_with_dependencies(preprocessor, storage))
    }

    pub fn import_bytes(&mut self, bytes: &[u8], config: &EngineConfig) -> Result<ImportReport> {
        self.import_bytes_with_options(bytes, config, &ImportOptions::default())
    }

    /// Package bytes + config → categorized Document with its variable catalog.
    /// Results are cached by package and config hash unless `skip_cache` is set.
    pub fn import_bytes_with_options(
        &mut self,
        bytes: &[u8],
        config: &EngineConfig,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(options.profile);

        let cache_key = profiler.time_step("Cache Key Generation", || {
            let package_hash = calculate_package_hash(bytes);
            let config_hash = calculate_config_hash(&ImportSettings {
                preprocessor: self.preprocessor.name(),
                parser: &config.parser,
                detection: &config.detection,
                canvas: &config.canvas,
            })?;
            Ok::<ImportCacheKey, anyhow::Error>(ImportCacheKey::new(package_hash, config_hash))
        })?;

        let cached = if options.skip_cache {
            tracing::debug!("skipping import cache lookup");
            None
        } else {
            profiler.time_step("Cache Lookup", || self.storage.get_import_output(&cache_key))?
        };

        if let Some(cached) = cached {
            tracing::info!(
                slides = cached.parsed.document.slides.len(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "import cache hit"
            );
            profiler.log_summary();
            return Ok(ImportReport {
                document: cached.parsed.document,
                warnings: cached.parsed.warnings,
                cached: true,
            });
        }

        let parsed = self.run_import(bytes, config, &mut profiler)?;

        if !options.skip_cache {
            profiler.time_step("Cache Storage", || {
                let processing_time = start_time.elapsed().as_millis() as u64;
                let cache_value = ImportCacheValue::new(parsed.clone(), processing_time);
                self.storage.store_import_output(&cache_key, &cache_value)
            })?;
        }

        profiler.log_summary();
        tracing::info!(
            slides = parsed.document.slides.len(),
            variables = parsed.document.variables.len(),
            warnings = parsed.warnings.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "package imported"
        );

        Ok(ImportReport {
            document: parsed.document,
            warnings: parsed.warnings,
            cached: false,
        })
    }

    pub fn import_file(
        &mut self,
        input_path: &str,
        config: &EngineConfig,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        let path = Path::new(input_path);
        if !self.preprocessor.supports_file_type(path) {
            tracing::warn!(
                path = input_path,
                preprocessor = self.preprocessor.name(),
                "unexpected file extension, attempting import anyway"
            );
        }
        let bytes = std::fs::read(path).map_err(|e| anyhow!("Failed to read {}: {}", input_path, e))?;
        self.import_bytes_with_options(&bytes, config, options)
    }

    fn run_import(
        &self,
        bytes: &[u8],
        config: &EngineConfig,
        profiler: &mut StepProfiler,
    ) -> Result<ParsedPackage> {
        let package = profiler.time_step("1. Read Package", || self.preprocessor.read_package(bytes))?;

        let mut parsed = profiler.time_step("2. Build Document", || {
            self.preprocessor.build_document(&package)
        })?;

        profiler.time_step("3. Categorize Slides", || {
            for slide in &mut parsed.document.slides {
                slide.category = self.categorizer.categorize_slide(slide);
                tracing::debug!(slide = slide.index, category = slide.category.label(), "categorized");
            }
        });

        let detector = VariableDetector::new(config.detection.clone())?;
        let catalog = profiler.time_step("4. Detect Variables", || detector.detect(&parsed.document));
        parsed.document.variables = catalog;

        Ok(parsed)
    }

    /// Editing session over an imported document
    pub fn open_model(&self, document: Document, config: &EngineConfig) -> DocumentModel {
        DocumentModel::new(document, &config.history, &config.canvas)
    }

    pub fn export_document(
        &self,
        document: &Document,
        substitutions: &HashMap<String, String>,
        config: &EngineConfig,
    ) -> Result<ExportReport> {
        let exporter = PackageExporter::new(config.export.clone(), config.canvas.extent());
        let report = exporter.export_with_report(document, substitutions)?;
        for warning in &report.warnings {
            tracing::warn!(%warning, "export degraded a component");
        }
        Ok(report)
    }

    pub fn export_to_file(
        &self,
        document: &Document,
        substitutions: &HashMap<String, String>,
        config: &EngineConfig,
        output_path: &str,
    ) -> Result<ExportReport> {
        let report = self.export_document(document, substitutions, config)?;
        std::fs::write(output_path, &report.bytes)
            .map_err(|e| anyhow!("Failed to write {}: {}", output_path, e))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_package(config: &EngineConfig) -> Vec<u8> {
        let mut cover = Slide::new("Quarterly Review");
        cover.components.push(Component::new(
            ComponentProps::Text(TextProps::new("Prepared for {{client_name}}")),
            Position::new(100.0, 300.0),
            Size::new(1200.0, 120.0),
        ));
        let mut allocation = Slide::new("Target Allocation Strategy");
        allocation.components.push(Component::new(
            ComponentProps::Text(TextProps::new("Target Allocation Strategy")),
            Position::new(80.0, 60.0),
            Size::new(1760.0, 120.0),
        ));
        let mut document = Document::new();
        document.slides = vec![cover, allocation];
        document.reindex_slides();

        PackageExporter::new(config.export.clone(), config.canvas.extent())
            .export(&document, &HashMap::new())
            .unwrap()
    }

    #[test]
    fn import_categorizes_and_detects() {
        let config = EngineConfig::default();
        let mut processor = DocumentProcessor::new_cli(&config, None).unwrap();

        let report = processor.import_bytes(&sample_package(&config), &config).unwrap();
        assert!(!report.cached);
        assert_eq!(report.document.slides.len(), 2);
        assert_eq!(report.document.slides[1].category, Category::TargetAllocation);
        assert!(report.document.variables.get("client_name").is_some());
    }

    #[test]
    fn second_import_is_served_from_cache() {
        let config = EngineConfig::default();
        let cache_dir = std::env::temp_dir().join(format!("deckwright_proc_cache_{}", uuid::Uuid::new_v4()));
        let cache_dir = cache_dir.to_string_lossy().to_string();
        let mut processor = DocumentProcessor::new_cli(&config, Some(&cache_dir)).unwrap();
        let bytes = sample_package(&config);

        let first = processor.import_bytes(&bytes, &config).unwrap();
        let second = processor.import_bytes(&bytes, &config).unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.document, second.document);

        let bypass = ImportOptions {
            profile: true,
            skip_cache: true,
        };
        assert!(!processor.import_bytes_with_options(&bytes, &config, &bypass).unwrap().cached);

        std::fs::remove_dir_all(&cache_dir).ok();
    }

    #[test]
    fn corrupt_bytes_fail_import() {
        let config = EngineConfig::default();
        let mut processor = DocumentProcessor::new_cli(&config, None).unwrap();
        assert!(processor.import_bytes(b"not a zip", &config).is_err());
    }

    #[test]
    fn profiler_records_only_when_enabled() {
        let mut off = StepProfiler::new(false);
        assert_eq!(off.time_step("noop", || 1 + 1), 2);
        assert!(off.timings().is_empty());

        let mut on = StepProfiler::new(true);
        on.time_step("work", || ());
        assert_eq!(on.timings().len(), 1);
        assert_eq!(on.timings()[0].0, "work");
    }
}
