use crate::config::DetectionConfig;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Pre-compiled pattern families
static EXPLICIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2}|(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4})\b",
    )
    .unwrap()
});

static CURRENCY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:\s?(?:thousand|million|billion)\b|[KMB]\b)?",
    )
    .unwrap()
});

static PERCENTAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?%").unwrap());

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d[\d,]*(?:\.\d+)?$").unwrap());

/// A single match inside one slide's text
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMatch {
    pub name: String,
    pub span: String,
    pub inferred_type: VariableType,
    pub confidence: Confidence,
}

/// Finds template variables in slide text.
///
/// Families run in a fixed order: explicit `{{name}}` placeholders, labeled
/// person names, dates, currency amounts, percentages. Everything but the
/// explicit family gets a synthetic name indexed by its position on the slide.
pub struct VariableDetector {
    config: DetectionConfig,
    labeled_name: Option<Regex>,
}

impl VariableDetector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        let labeled_name = if config.labeled_names && !config.name_labels.is_empty() {
            let labels: Vec<String> = config.name_labels.iter().map(|l| regex::escape(l)).collect();
            Some(Regex::new(&format!(
                r"(?P<label>{}):[ \t]*(?P<value>[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)",
                labels.join("|")
            ))?)
        } else {
            None
        };

        Ok(Self {
            config,
            labeled_name,
        })
    }

    /// Build the catalog for a whole document. Names are merged across
    /// slides; the first-seen value, type and confidence win and counts add up.
    pub fn detect(&self, document: &Document) -> VariableCatalog {
        let mut entries: Vec<DetectedVariable> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for slide in &document.slides {
            for found in self.detect_text(&slide.searchable_text()) {
                match positions.get(&found.name) {
                    Some(&at) => entries[at].occurrence_count += 1,
                    None => {
                        positions.insert(found.name.clone(), entries.len());
                        entries.push(DetectedVariable {
                            name: found.name,
                            sample_value: found.span,
                            inferred_type: found.inferred_type,
                            occurrence_count: 1,
                            confidence: found.confidence,
                        });
                    }
                }
            }
        }

        // stable: ties keep first-seen order
        entries.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));

        tracing::debug!(variables = entries.len(), "variable catalog built");
        VariableCatalog { entries }
    }

    /// All matches in one slide's text, family by family
    pub fn detect_text(&self, text: &str) -> Vec<VariableMatch> {
        let mut found = Vec::new();

        if self.config.explicit_placeholders {
            for caps in EXPLICIT_REGEX.captures_iter(text) {
                let name = caps[1].trim().to_string();
                if name.is_empty() {
                    continue;
                }
                found.push(VariableMatch {
                    inferred_type: infer_type(&name, ""),
                    name,
                    span: caps[0].to_string(),
                    confidence: Confidence::Explicit,
                });
            }
        }

        if let Some(labeled_name) = &self.labeled_name {
            let mut per_label: HashMap<String, usize> = HashMap::new();
            for caps in labeled_name.captures_iter(text) {
                let label = slug(&caps["label"]);
                let count = per_label.entry(label.clone()).or_insert(0);
                *count += 1;
                found.push(VariableMatch {
                    name: format!("{label}_name_{count}"),
                    span: caps["value"].to_string(),
                    inferred_type: VariableType::Name,
                    confidence: Confidence::Inferred,
                });
            }
        }

        let families: [(bool, &Regex, &str, VariableType); 3] = [
            (self.config.dates, &*DATE_REGEX, "date", VariableType::Date),
            (self.config.currency, &*CURRENCY_REGEX, "amount", VariableType::Currency),
            (self.config.percentages, &*PERCENTAGE_REGEX, "percentage", VariableType::Percentage),
        ];
        for (enabled, pattern, prefix, inferred_type) in families {
            if !enabled {
                continue;
            }
            for (i, m) in pattern.find_iter(text).enumerate() {
                found.push(VariableMatch {
                    name: format!("{prefix}_{}", i + 1),
                    span: m.as_str().to_string(),
                    inferred_type,
                    confidence: Confidence::Inferred,
                });
            }
        }

        found
    }
}

/// Type from name hints first, then the shape of the value
pub fn infer_type(name: &str, value: &str) -> VariableType {
    let name = name.to_lowercase();
    let value = value.trim();

    if name.contains("name") {
        VariableType::Name
    } else if name.contains("date") {
        VariableType::Date
    } else if name.contains("percent") || name.contains("pct") || value.ends_with('%') {
        VariableType::Percentage
    } else if ["amount", "fee", "balance", "value", "aum"]
        .iter()
        .any(|hint| name.contains(hint))
        || value.starts_with('$')
    {
        VariableType::Currency
    } else if NUMBER_REGEX.is_match(value) {
        VariableType::Number
    } else {
        VariableType::Text
    }
}

fn slug(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
