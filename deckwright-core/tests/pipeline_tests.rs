//! Pipeline boundary tests: package bytes in, package bytes out.
//!
//! Packages are assembled in memory so no fixtures are needed:
//!
//! - Import boundary: slide ordering, malformed part tolerance, corrupt containers
//! - Detection: variable catalog dedup, categorization determinism
//! - Editing: history laws over real command sequences
//! - Export boundary: substitution, re-import of exported packages

use deckwright_core::config::EngineConfig;
use deckwright_core::error::{ImportError, ImportWarning};
use deckwright_core::layout::{LayoutTransform, ROUND_TRIP_EPSILON};
use deckwright_core::model::{ComponentDraft, ComponentUpdate, DocumentModel, SlideDraft};
use deckwright_core::package::{PackageParser, Preprocessor};
use deckwright_core::registry::ComponentRegistry;
use deckwright_core::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Package helpers
// ============================================================================

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// One text box per slide, one paragraph per line
fn slide_part(lines: &[&str]) -> String {
    let paragraphs: String = lines
        .iter()
        .map(|line| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{line}</a:t></a:r></a:p>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Text 1"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
    )
}

/// Opens its tree and never closes it
fn malformed_slide_part() -> String {
    format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree><p:sp>"#)
}

fn build_package(slides: &[(u32, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    zip.start_file("ppt/presentation.xml", options).unwrap();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#
    )
    .unwrap();

    for (number, xml) in slides {
        zip.start_file(format!("ppt/slides/slide{number}.xml"), options)
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn import(bytes: &[u8]) -> ImportReport {
    let config = EngineConfig::default();
    let mut processor = DocumentProcessor::new_cli(&config, None).unwrap();
    processor.import_bytes(bytes, &config).unwrap()
}

fn texts(slide: &Slide) -> Vec<String> {
    slide
        .components
        .iter()
        .flat_map(|c| c.props.text_fields())
        .map(str::to_string)
        .collect()
}

fn subs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Import boundary
// ============================================================================

mod import_boundary {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn malformed_slide_becomes_placeholder() {
        let slides: Vec<(u32, String)> = (1..=5)
            .map(|n| {
                let xml = if n == 3 {
                    malformed_slide_part()
                } else {
                    slide_part(&[&format!("Slide {n} Overview"), "Portfolio commentary for the quarter"])
                };
                (n, xml)
            })
            .collect();

        let report = import(&build_package(&slides));
        let document = &report.document;

        assert_eq!(document.slides.len(), 5);
        assert_eq!(
            document.slides.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(document.slides[2].extraction, ExtractionStatus::Failed);
        assert_eq!(
            document.slides[2].text_content,
            EngineConfig::default().parser.placeholder_text
        );
        assert_eq!(document.slides[3].title, "Slide 4 Overview");
        assert!(matches!(
            &report.warnings[..],
            [ImportWarning::PartialExtractionFailure { part, .. }] if part == "ppt/slides/slide3.xml"
        ));
    }

    #[test]
    fn slides_follow_part_numbers() {
        let slides = vec![
            (10, slide_part(&["Tenth Slide Title", "Closing remarks and next steps"])),
            (2, slide_part(&["Second Slide Title", "Market overview and commentary"])),
            (1, slide_part(&["First Slide Title", "Welcome and agenda for today"])),
        ];
        let titles: Vec<String> = import(&build_package(&slides))
            .document
            .slides
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["First Slide Title", "Second Slide Title", "Tenth Slide Title"]);
    }

    #[test]
    fn corrupt_container_is_fatal() {
        let parser = PackageParser::default();
        assert!(matches!(
            parser.process(b"definitely not a package"),
            Err(ImportError::CorruptPackage(_))
        ));
    }

    #[test]
    fn short_text_gets_placeholder() {
        let report = import(&build_package(&[(1, slide_part(&["Hi"]))]));
        let slide = &report.document.slides[0];
        assert_eq!(slide.extraction, ExtractionStatus::Placeholder);
        assert_eq!(slide.text_content, EngineConfig::default().parser.placeholder_text);
    }
}

// ============================================================================
// Detection
// ============================================================================

mod detection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_placeholder_is_one_entry() {
        let slides = vec![
            (1, slide_part(&["Welcome Letter", "Dear {{client_name}}, welcome aboard"])),
            (2, slide_part(&["Summary Page", "Prepared for {{client_name}} by the team"])),
        ];
        let catalog = import(&build_package(&slides)).document.variables;

        let entries: Vec<&DetectedVariable> = catalog.iter().filter(|v| v.name == "client_name").collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].occurrence_count, 2);
        assert_eq!(entries[0].confidence, Confidence::Explicit);
    }

    #[test]
    fn categorization_is_deterministic() {
        let slides = vec![(1, slide_part(&["Target Allocation Strategy", "Equities 60% and bonds 40%"]))];
        let bytes = build_package(&slides);

        let first = import(&bytes).document.slides[0].category;
        let second = import(&bytes).document.slides[0].category;
        assert_eq!(first, Category::TargetAllocation);
        assert_eq!(first, second);

        let categorizer = SlideCategorizer::new();
        for _ in 0..3 {
            assert_eq!(
                categorizer.categorize("Target Allocation Strategy", ""),
                Category::TargetAllocation
            );
        }
    }
}

// ============================================================================
// Editing
// ============================================================================

mod editing {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model() -> DocumentModel {
        let slides = vec![
            (1, slide_part(&["Quarterly Review", "Performance summary for the period"])),
            (2, slide_part(&["Fee Schedule", "Advisory fee of 0.75% per annum"])),
        ];
        let config = EngineConfig::default();
        let document = import(&build_package(&slides)).document;
        DocumentModel::new(document, &config.history, &config.canvas)
    }

    #[test]
    fn undo_all_then_redo_all() {
        let mut model = model();
        let initial = model.document().clone();
        let first = initial.slides[0].id;

        let registry = ComponentRegistry::new();
        let draft = registry.draft("single-metric", Some(Position::new(100.0, 700.0))).unwrap();
        let metric = model.add_component(first, draft).unwrap();
        model.move_component(metric, Position::new(300.0, 700.0)).unwrap();
        model.add_slide(None).unwrap();
        model.reorder_slides(2, 0).unwrap();
        let final_state = model.document().clone();

        for _ in 0..4 {
            assert!(model.undo());
        }
        assert!(!model.undo());
        assert_eq!(model.document(), &initial);

        for _ in 0..4 {
            assert!(model.redo());
        }
        assert!(!model.redo());
        assert_eq!(model.document(), &final_state);
    }

    #[test]
    fn new_command_discards_redo_branch() {
        let mut model = model();
        let first = model.document().slides[0].id;

        model
            .update_slide(first, deckwright_core::model::SlideUpdate {
                title: Some("Renamed".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(model.undo());
        assert!(model.can_redo());

        model.add_slide(Some(SlideDraft::default())).unwrap();
        assert!(!model.can_redo());
        assert!(!model.redo());
    }

    #[test]
    fn indices_stay_contiguous() {
        let mut model = model();
        model.add_slide(None).unwrap();
        model.add_slide(Some(SlideDraft {
            at: Some(0),
            ..Default::default()
        }))
        .unwrap();
        let second = model.document().slides[1].id;
        model.delete_slide(second).unwrap();
        model.reorder_slides(0, 2).unwrap();

        let indices: Vec<usize> = model.document().slides.iter().map(|s| s.index).collect();
        assert_eq!(indices, (0..model.document().slides.len()).collect::<Vec<_>>());
    }

    #[test]
    fn rejected_command_is_invisible() {
        let mut model = model();
        let before = model.document().clone();
        let snapshots = model.history().len();

        let component = before.slides[0].components[0].id;
        let result = model.update_component(
            component,
            ComponentUpdate {
                size: Some(Size::new(0.0, 10.0)),
                ..Default::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(model.document(), &before);
        assert_eq!(model.history().len(), snapshots);
    }
}

// ============================================================================
// Export boundary
// ============================================================================

mod export_boundary {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn explicit_substitution_scenario() {
        let mut slide = Slide::new("Client Letter");
        slide.components.push(Component::new(
            ComponentProps::Text(TextProps::new("Dear {{client_name}}, your balance is {{balance}}.")),
            Position::new(100.0, 200.0),
            Size::new(1200.0, 200.0),
        ));
        let mut document = Document::new();
        document.slides.push(slide);

        let values = subs(&[("client_name", "Jane Doe"), ("balance", "$1,000")]);
        let bytes = PackageExporter::default().export(&document, &values).unwrap();

        let reimported = import(&bytes).document;
        assert!(texts(&reimported.slides[0])
            .iter()
            .any(|t| t == "Dear Jane Doe, your balance is $1,000."));

        let previews = preview(&document, &values);
        assert!(previews[0].text.contains("Dear Jane Doe, your balance is $1,000."));
    }

    #[test]
    fn unknown_placeholders_survive_export() {
        let mut slide = Slide::new("Letter");
        slide.components.push(Component::new(
            ComponentProps::Text(TextProps::new("Hello {{first_name}} {{last_name}}")),
            Position::new(100.0, 200.0),
            Size::new(1200.0, 200.0),
        ));
        let mut document = Document::new();
        document.slides.push(slide);

        let bytes = PackageExporter::default()
            .export(&document, &subs(&[("first_name", "Jane")]))
            .unwrap();
        assert!(texts(&import(&bytes).document.slides[0])
            .iter()
            .any(|t| t == "Hello Jane {{last_name}}"));
    }

    #[test]
    fn import_edit_export_reimport() {
        let slides = vec![
            (1, slide_part(&["Quarterly Review", "Prepared for {{client_name}}"])),
            (2, slide_part(&["Fee Schedule", "Advisory fee of 0.75% per annum"])),
        ];
        let config = EngineConfig::default();
        let mut processor = DocumentProcessor::new_cli(&config, None).unwrap();
        let imported = processor.import_bytes(&build_package(&slides), &config).unwrap();
        let mut model = processor.open_model(imported.document, &config);

        let fees = model.document().slides[1].id;
        let chart = ComponentDraft::new(
            ComponentProps::Chart(ChartProps {
                chart_type: ChartType::Pie,
                data: vec![DataPoint::new("Advisory", 75.0), DataPoint::new("Custody", 25.0)],
                title: Some("Fee Split".to_string()),
            }),
            Position::new(1000.0, 300.0),
            Size::new(600.0, 500.0),
        );
        let chart_id = model.add_component(fees, chart).unwrap();
        model.add_slide(Some(SlideDraft {
            title: Some("Next Steps".to_string()),
            components: vec![ComponentDraft::new(
                ComponentProps::Text(TextProps::new("Next Steps")),
                Position::new(80.0, 60.0),
                Size::new(1760.0, 120.0),
            )],
            ..Default::default()
        }))
        .unwrap();

        let edited = model.into_document();
        let report = processor
            .export_document(&edited, &subs(&[("client_name", "Jane Doe")]), &config)
            .unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.slide_count, 3);

        let reimported = import(&report.bytes).document;
        assert_eq!(reimported.slides.len(), 3);
        assert!(texts(&reimported.slides[0]).iter().any(|t| t.contains("Prepared for Jane Doe")));
        assert_eq!(reimported.slides[2].title, "Next Steps");

        let original_chart = edited.component(chart_id).unwrap();
        let chart = reimported.slides[1]
            .components
            .iter()
            .find(|c| c.kind() == ComponentKind::Chart)
            .unwrap();
        assert_eq!(chart.props, original_chart.props);
        assert!((chart.position.x - original_chart.position.x).abs() < 1.0);
        assert!((chart.size.height - original_chart.size.height).abs() < 1.0);
    }
}

// ============================================================================
// Layout
// ============================================================================

mod layout {
    use super::*;

    #[test]
    fn virtual_physical_round_trip() {
        let transform = LayoutTransform::new(Extent::new(1920.0, 1080.0), Extent::new(9_144_000.0, 6_858_000.0));
        for rect in [
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(13.5, 977.25, 0.5, 3.0),
            Rect::new(-40.0, 2000.0, 333.3, 1.0),
        ] {
            let back = transform.to_physical(transform.to_virtual(transform.to_physical(rect)));
            let physical = transform.to_physical(rect);
            assert!((back.x - physical.x).abs() < ROUND_TRIP_EPSILON);
            assert!((back.y - physical.y).abs() < ROUND_TRIP_EPSILON);
            assert!((back.width - physical.width).abs() < ROUND_TRIP_EPSILON);
            assert!((back.height - physical.height).abs() < ROUND_TRIP_EPSILON);
        }
    }

    #[test]
    fn virtual_space_round_trip() {
        let transform = LayoutTransform::new(Extent::new(1920.0, 1080.0), Extent::new(9_144_000.0, 6_858_000.0));
        for rect in [
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(13.5, 977.25, 0.5, 3.0),
            Rect::new(-40.0, 2000.0, 333.3, 1.0),
        ] {
            let back = transform.to_virtual(transform.to_physical(rect));
            assert!((back.x - rect.x).abs() < ROUND_TRIP_EPSILON);
            assert!((back.y - rect.y).abs() < ROUND_TRIP_EPSILON);
            assert!((back.width - rect.width).abs() < ROUND_TRIP_EPSILON);
            assert!((back.height - rect.height).abs() < ROUND_TRIP_EPSILON);
        }
    }
}
