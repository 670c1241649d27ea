use crate::types::*;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

/// Substitution rules resolved against one document's variable catalog.
///
/// Explicit `{{name}}` placeholders are filled from the map, and the literal
/// spans of inferred catalog entries whose name has a value are replaced.
/// Both run in a single left-to-right scan over the source text, so inserted
/// values are never substituted again. Entries without a value are left alone.
#[derive(Debug, Clone)]
pub struct Substitutions<'a> {
    values: &'a HashMap<String, String>,
    literal_spans: HashMap<&'a str, &'a str>,
    matcher: Option<Regex>,
}

impl<'a> Substitutions<'a> {
    pub fn new(catalog: &'a VariableCatalog, values: &'a HashMap<String, String>) -> Self {
        let mut spans: Vec<(&str, &str)> = catalog
            .iter()
            .filter(|v| v.confidence == Confidence::Inferred && !v.sample_value.is_empty())
            .filter_map(|v| {
                values
                    .get(&v.name)
                    .map(|value| (v.sample_value.as_str(), value.as_str()))
            })
            .collect();

        // "$1,250,000" must win over "$1,250" at the same position
        spans.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut pattern = PLACEHOLDER_REGEX.as_str().to_string();
        let mut literal_spans = HashMap::new();
        for &(span, value) in &spans {
            if literal_spans.contains_key(span) {
                continue;
            }
            literal_spans.insert(span, value);
            pattern.push('|');
            pattern.push_str(&regex::escape(span));
        }

        let matcher = match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(error = %e, spans = literal_spans.len(), "inferred spans not substitutable");
                None
            }
        };

        Self {
            values,
            literal_spans,
            matcher,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        if self.values.is_empty() || text.is_empty() {
            return text.to_string();
        }

        let matcher = self.matcher.as_ref().unwrap_or(&*PLACEHOLDER_REGEX);
        matcher
            .replace_all(text, |caps: &Captures| match caps.get(1) {
                Some(name) => match self.values.get(name.as_str().trim()) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                },
                None => match self.literal_spans.get(&caps[0]) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                },
            })
            .into_owned()
    }

    /// Substitute every user-visible string of a slide in place
    pub fn apply_to_slide(&self, slide: &mut Slide) {
        slide.title = self.apply(&slide.title);
        slide.text_content = self.apply(&slide.text_content);
        for component in slide.components.iter_mut() {
            for field in component.props.text_fields_mut() {
                *field = self.apply(field);
            }
        }
    }
}

/// Copy of `document` with substitutions applied to every slide
pub fn substitute_document(document: &Document, values: &HashMap<String, String>) -> Document {
    let mut substituted = document.clone();
    let substitutions = Substitutions::new(&document.variables, values);
    if substitutions.is_empty() {
        return substituted;
    }
    for slide in substituted.slides.iter_mut() {
        substitutions.apply_to_slide(slide);
    }
    substituted
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePreview {
    pub index: usize,
    pub title: String,
    pub text: String,
}

/// Titles and text as they would be exported, without building a package
pub fn preview(document: &Document, values: &HashMap<String, String>) -> Vec<SlidePreview> {
    let substitutions = Substitutions::new(&document.variables, values);
    document
        .slides
        .iter()
        .map(|slide| SlidePreview {
            index: slide.index,
            title: substitutions.apply(&slide.title),
            text: substitutions.apply(&slide.searchable_text()),
        })
        .collect()
}
