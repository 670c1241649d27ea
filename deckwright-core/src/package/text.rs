//! Raw text extraction from slide parts.
//!
//! Runs inside one drawing paragraph are concatenated; every paragraph, and
//! every stray text leaf outside a paragraph, becomes one line. Package noise
//! (namespace URIs, GUID tokens, bare numbers such as slide numbers) is then
//! stripped line by line.

use crate::config::ParserConfig;
use crate::error::PartError;
use crate::types::{ExtractionStatus, UNTITLED_SLIDE};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled noise patterns
static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"https?://schemas\.(?:openxmlformats\.org|microsoft\.com)\S*").unwrap(),
        Regex::new(r"urn:schemas-microsoft-com:\S*").unwrap(),
        Regex::new(
            r"\{[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}\}",
        )
        .unwrap(),
    ]
});

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{00A0}]+").unwrap());

static NUMERIC_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Text pulled from one slide part
#[derive(Debug, Clone, PartialEq)]
pub struct SlideText {
    pub title: String,
    /// Cleaned lines joined by newlines, or the placeholder text
    pub text: String,
    pub status: ExtractionStatus,
}

pub fn extract_lines_from_bytes(bytes: &[u8]) -> Result<Vec<String>, PartError> {
    let xml = std::str::from_utf8(bytes).map_err(|_| PartError::Encoding)?;
    extract_lines(xml)
}

/// Walk a part and collect its text leaves in document order.
/// Fails on any XML error, including elements left open at end of input.
pub fn extract_lines(xml: &str) -> Result<Vec<String>, PartError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut open: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut paragraph: Option<String> = None;
    let mut lines = Vec::new();

    loop {
        let event = reader.read_event().map_err(|source| PartError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(e) => {
                seen_root = true;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "p" {
                    paragraph = Some(String::new());
                }
                open.push(name);
            }
            Event::Empty(e) => {
                seen_root = true;
                if e.local_name().as_ref() == b"br" {
                    if let Some(current) = paragraph.as_mut() {
                        current.push('\n');
                    }
                }
            }
            Event::End(_) => {
                if open.pop().as_deref() == Some("p") {
                    if let Some(done) = paragraph.take() {
                        lines.extend(done.split('\n').map(str::to_string));
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|source| PartError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                push_text(&mut paragraph, &mut lines, &text);
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                push_text(&mut paragraph, &mut lines, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(PartError::Unclosed(unclosed));
    }
    if !seen_root {
        return Err(PartError::Empty);
    }
    Ok(lines)
}

fn push_text(paragraph: &mut Option<String>, lines: &mut Vec<String>, text: &str) {
    match paragraph {
        Some(current) => current.push_str(text),
        None if !text.trim().is_empty() => lines.push(text.to_string()),
        None => {}
    }
}

/// Strip package noise, collapse whitespace and drop empty or purely numeric lines
pub fn clean_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| line.split('\n'))
        .map(|line| {
            let stripped = NOISE_PATTERNS
                .iter()
                .fold(line.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
            WHITESPACE_REGEX.replace_all(stripped.trim(), " ").into_owned()
        })
        .filter(|line| !line.is_empty() && !NUMERIC_LINE_REGEX.is_match(line))
        .collect()
}

/// Title and text for a slide from its cleaned lines
pub fn summarize(lines: &[String], config: &ParserConfig) -> SlideText {
    let title = lines
        .first()
        .map(|line| truncate_chars(line, config.max_title_chars))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED_SLIDE.to_string());

    let text = lines.join("\n");
    if text.chars().count() < config.min_text_chars {
        return SlideText {
            title,
            text: config.placeholder_text.clone(),
            status: ExtractionStatus::Placeholder,
        };
    }

    SlideText {
        title,
        text,
        status: ExtractionStatus::Clean,
    }
}

/// Stand-in for a part that could not be read at all
pub fn failed(config: &ParserConfig) -> SlideText {
    SlideText {
        title: UNTITLED_SLIDE.to_string(),
        text: config.placeholder_text.clone(),
        status: ExtractionStatus::Failed,
    }
}

pub fn has_chart_marker(xml: &[u8], markers: &[String]) -> bool {
    let raw = String::from_utf8_lossy(xml);
    markers.iter().any(|marker| raw.contains(marker.as_str()))
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp><p:txBody>
      <a:p><a:r><a:t>Quarterly </a:t></a:r><a:r><a:t>Review</a:t></a:r></a:p>
    </p:txBody></p:sp>
    <p:sp><p:txBody>
      <a:p><a:r><a:t>Client: Jane Doe</a:t></a:r><a:br/><a:r><a:t>Fees &amp; costs</a:t></a:r></a:p>
      <a:p><a:r><a:t>12</a:t></a:r></a:p>
      <a:p><a:r><a:t>{6F9619FF-8B86-D011-B42D-00C04FC964FF}</a:t></a:r></a:p>
    </p:txBody></p:sp>
  </p:spTree></p:cSld>
</p:sld>"#;

    #[test]
    fn runs_join_within_paragraphs() {
        let lines = clean_lines(&extract_lines(SLIDE).unwrap());
        assert_eq!(lines, vec!["Quarterly Review", "Client: Jane Doe", "Fees & costs"]);
    }

    #[test]
    fn summary_takes_first_line_as_title() {
        let lines = clean_lines(&extract_lines(SLIDE).unwrap());
        let summary = summarize(&lines, &ParserConfig::default());
        assert_eq!(summary.title, "Quarterly Review");
        assert_eq!(summary.status, ExtractionStatus::Clean);
        assert!(summary.text.contains("Client: Jane Doe"));
    }

    #[test]
    fn short_text_becomes_placeholder() {
        let summary = summarize(&["Hi".to_string()], &ParserConfig::default());
        assert_eq!(summary.title, "Hi");
        assert_eq!(summary.text, "Slide content extracted successfully");
        assert_eq!(summary.status, ExtractionStatus::Placeholder);

        let empty = summarize(&[], &ParserConfig::default());
        assert_eq!(empty.title, UNTITLED_SLIDE);
    }

    #[test]
    fn long_titles_are_truncated() {
        let config = ParserConfig {
            max_title_chars: 5,
            ..ParserConfig::default()
        };
        let summary = summarize(&["Performance overview".to_string()], &config);
        assert_eq!(summary.title, "Perfo");
    }

    #[test]
    fn explicit_placeholders_survive_cleaning() {
        let lines = clean_lines(&["Prepared for {{client_name}} ".to_string(), "{{face}}".to_string()]);
        assert_eq!(lines, vec!["Prepared for {{client_name}}", "{{face}}"]);
    }

    #[test]
    fn namespace_noise_is_removed() {
        let lines = clean_lines(&[
            "http://schemas.openxmlformats.org/drawingml/2006/main".to_string(),
            "see urn:schemas-microsoft-com:office".to_string(),
        ]);
        assert_eq!(lines, vec!["see"]);
    }

    #[test]
    fn mismatched_tags_fail() {
        let result = extract_lines("<p:sld><a:t>oops</p:sld>");
        assert!(matches!(result, Err(PartError::Xml { .. })));
    }

    #[test]
    fn truncated_part_fails() {
        let result = extract_lines("<p:sld><p:cSld><a:t>cut off");
        assert!(matches!(result, Err(PartError::Unclosed(_))));
    }

    #[test]
    fn empty_part_fails() {
        assert!(matches!(extract_lines("   "), Err(PartError::Empty)));
        assert!(matches!(extract_lines_from_bytes(&[0xff, 0xfe, 0x00]), Err(PartError::Encoding)));
    }

    #[test]
    fn chart_marker_detection() {
        let markers = ParserConfig::default().chart_markers;
        assert!(has_chart_marker(br#"<c:chart r:id="rId2"/>"#, &markers));
        assert!(!has_chart_marker(b"<a:t>chart of accounts</a:t>", &markers));
    }
}
