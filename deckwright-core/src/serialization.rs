use crate::types::*;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0.0";

/// On-disk form of a document snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub schema_version: String,
    pub saved_at: DateTime<Utc>,
    pub document: Document,
}

impl PersistedDocument {
    pub fn new(document: Document) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            document,
        }
    }
}

/// Condensed view of a document for inspection: one entry per slide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentOutline {
    pub format: String,
    pub slides: Vec<OutlineSlide>,
    pub variables: Vec<OutlineVariable>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineSlide {
    pub index: usize,
    pub title: String,
    pub category: String,
    pub extraction: ExtractionStatus,
    pub components: Vec<String>,
    pub has_chart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineVariable {
    pub name: String,
    pub sample_value: String,
    pub inferred_type: VariableType,
    pub occurrences: usize,
    pub confidence: Confidence,
}

impl Document {
    pub fn to_json(&self) -> Result<String> {
        let persisted = PersistedDocument::new(self.clone());
        Ok(serde_json::to_string_pretty(&persisted)?)
    }

    /// Accepts a persisted envelope or a bare document
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("document").is_some() {
            let persisted: PersistedDocument = serde_json::from_value(value)?;
            if persisted.schema_version.split('.').next() != SCHEMA_VERSION.split('.').next() {
                return Err(anyhow!(
                    "unsupported schema version {} (expected {})",
                    persisted.schema_version,
                    SCHEMA_VERSION
                ));
            }
            Ok(persisted.document)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    pub fn save_to_json(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_json(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read document {}: {}", path, e))?;
        Self::from_json(&json)
    }

    pub fn to_outline(&self) -> DocumentOutline {
        let slides = self
            .slides
            .iter()
            .map(|slide| {
                let mut ordered: Vec<&Component> = slide.components.iter().collect();
                ordered.sort_by_key(|c| c.z_index());
                OutlineSlide {
                    index: slide.index,
                    title: slide.title.clone(),
                    category: slide.category.label().to_string(),
                    extraction: slide.extraction,
                    components: ordered.iter().map(|c| c.kind().as_str().to_string()).collect(),
                    has_chart: slide.has_chart,
                }
            })
            .collect();

        let variables = self
            .variables
            .iter()
            .map(|v| OutlineVariable {
                name: v.name.clone(),
                sample_value: v.sample_value.clone(),
                inferred_type: v.inferred_type,
                occurrences: v.occurrence_count,
                confidence: v.confidence,
            })
            .collect();

        DocumentOutline {
            format: "outline".to_string(),
            slides,
            variables,
        }
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> Result<()> {
        match format {
            "outline" => {
                let json = serde_json::to_string_pretty(&self.to_outline())?;
                std::fs::write(path, json)?;
            }
            "document" => self.save_to_json(path)?,
            other => return Err(anyhow!("unknown output format '{}'", other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        let mut slide = Slide::new("Performance Review");
        slide.category = Category::Performance;
        slide.components.push(Component::new(
            ComponentProps::Text(TextProps::new("Returns for {{client_name}}")),
            Position::new(10.0, 10.0),
            Size::new(400.0, 80.0),
        ));
        Document {
            slides: vec![slide],
            ..Document::default()
        }
    }

    #[test]
    fn json_round_trip_preserves_document() {
        let document = sample();
        let restored = Document::from_json(&document.to_json().unwrap()).unwrap();
        assert_eq!(restored, document);
    }

    #[test]
    fn bare_document_json_is_accepted() {
        let document = sample();
        let bare = serde_json::to_string(&document).unwrap();
        assert_eq!(Document::from_json(&bare).unwrap(), document);
    }

    #[test]
    fn newer_major_schema_is_rejected() {
        let mut persisted = PersistedDocument::new(sample());
        persisted.schema_version = "2.0.0".to_string();
        let json = serde_json::to_string(&persisted).unwrap();
        assert!(Document::from_json(&json).is_err());
    }

    #[test]
    fn outline_lists_slides_and_kinds() {
        let outline = sample().to_outline();
        assert_eq!(outline.slides.len(), 1);
        assert_eq!(outline.slides[0].components, vec!["text".to_string()]);
        assert_eq!(outline.slides[0].category, Category::Performance.label());
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("deckwright_doc_{}.json", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();
        let document = sample();
        document.save_to_json(&path).unwrap();
        assert_eq!(Document::load_from_json(&path).unwrap(), document);
        std::fs::remove_file(&path).ok();
    }
}
