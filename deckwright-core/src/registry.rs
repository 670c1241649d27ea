//! Component Registry - built-in palette entries the editor can insert

use crate::model::ComponentDraft;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaletteCategory {
    Charts,
    Text,
    Metrics,
    Layout,
    Media,
    Shapes,
    Investment,
}

/// One palette entry: a named component template
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub category: PaletteCategory,
    pub description: &'static str,
    pub default_position: Position,
    pub default_size: Size,
    pub default_style: Style,
    pub default_props: ComponentProps,
}

pub struct ComponentRegistry {
    definitions: Vec<ComponentDefinition>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            definitions: Vec::new(),
        };
        registry.register_builtins();
        registry
    }

    pub fn get(&self, id: &str) -> Option<&ComponentDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Definitions in palette order
    pub fn list(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    pub fn list_by_category(&self, category: PaletteCategory) -> Vec<&ComponentDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// A ready-to-insert draft for `definition_id`, at `position` when given
    pub fn draft(&self, definition_id: &str, position: Option<Position>) -> Option<ComponentDraft> {
        let definition = self.get(definition_id)?;
        Some(
            ComponentDraft::new(
                definition.default_props.clone(),
                position.unwrap_or(definition.default_position),
                definition.default_size,
            )
            .with_style(definition.default_style.clone()),
        )
    }

    fn register(&mut self, definition: ComponentDefinition) {
        self.definitions.push(definition);
    }

    fn register_builtins(&mut self) {
        // Charts
        self.register(chart(
            "portfolio-pie",
            "Portfolio Allocation (Pie)",
            "Pie chart for portfolio allocation",
            ChartType::Pie,
            Size::new(400.0, 300.0),
            &[("Stocks", 60.0), ("Bonds", 30.0), ("Cash", 10.0)],
        ));
        self.register(chart(
            "portfolio-donut",
            "Portfolio Allocation (Donut)",
            "Donut chart for portfolio allocation",
            ChartType::Donut,
            Size::new(400.0, 300.0),
            &[("Stocks", 60.0), ("Bonds", 30.0), ("Cash", 10.0)],
        ));
        self.register(chart(
            "performance-line",
            "Performance Chart",
            "Line chart for performance over time",
            ChartType::Line,
            Size::new(600.0, 300.0),
            &[("Q1", 100.0), ("Q2", 120.0), ("Q3", 115.0), ("Q4", 140.0)],
        ));
        self.register(chart(
            "bar-comparison",
            "Bar Comparison",
            "Bar chart for comparisons",
            ChartType::Bar,
            Size::new(500.0, 300.0),
            &[("Category A", 40.0), ("Category B", 60.0), ("Category C", 30.0)],
        ));

        // Text
        self.register(text(
            "heading-1",
            "Heading 1",
            "Large heading text",
            Size::new(600.0, 80.0),
            TextProps {
                font_size: 48.0,
                font_weight: FontWeight::Bold,
                ..TextProps::new("Heading 1")
            },
        ));
        self.register(text(
            "heading-2",
            "Heading 2",
            "Medium heading text",
            Size::new(600.0, 60.0),
            TextProps {
                font_size: 36.0,
                font_weight: FontWeight::Bold,
                ..TextProps::new("Heading 2")
            },
        ));
        self.register(text(
            "body-text",
            "Body Text",
            "Regular paragraph text",
            Size::new(600.0, 200.0),
            TextProps::new("Body text content goes here. You can edit this text."),
        ));
        self.register(text(
            "bullet-list",
            "Bullet List",
            "Bulleted list",
            Size::new(500.0, 200.0),
            TextProps {
                list_type: Some(ListType::Bullet),
                ..TextProps::new("Item 1\nItem 2\nItem 3")
            },
        ));

        // Metrics
        self.register(ComponentDefinition {
            id: "single-metric",
            name: "Single Metric",
            category: PaletteCategory::Metrics,
            description: "Single KPI/metric card",
            default_position: palette_origin(),
            default_size: Size::new(250.0, 150.0),
            default_style: Style {
                background_color: Some("#f0fdf4".to_string()),
                border_radius: Some(12.0),
                padding: Some(20.0),
                ..Style::default()
            },
            default_props: ComponentProps::Metric(MetricProps {
                label: "Total Assets".to_string(),
                value: "$1,000,000".to_string(),
                metrics: Vec::new(),
                columns: None,
            }),
        });
        self.register(ComponentDefinition {
            id: "metric-grid",
            name: "Metric Grid",
            category: PaletteCategory::Metrics,
            description: "Grid of multiple metrics",
            default_position: palette_origin(),
            default_size: Size::new(800.0, 200.0),
            default_style: Style {
                border_radius: Some(12.0),
                ..Style::default()
            },
            default_props: ComponentProps::Metric(MetricProps {
                label: String::new(),
                value: String::new(),
                metrics: [("Assets", "$1M"), ("Returns", "+12%"), ("Risk", "Medium")]
                    .iter()
                    .map(|(label, value)| MetricEntry {
                        label: label.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                columns: Some(3),
            }),
        });

        // Layout
        self.register(columns("two-columns", "Two Columns", "Two column layout", 2, 800.0));
        self.register(columns("three-columns", "Three Columns", "Three column layout", 3, 900.0));

        // Media
        self.register(ComponentDefinition {
            id: "image",
            name: "Image",
            category: PaletteCategory::Media,
            description: "Image placeholder",
            default_position: palette_origin(),
            default_size: Size::new(400.0, 300.0),
            default_style: Style::default(),
            default_props: ComponentProps::Image(ImageProps {
                src: None,
                alt: "Image".to_string(),
                data: None,
            }),
        });

        // Shapes
        self.register(ComponentDefinition {
            id: "rectangle",
            name: "Rectangle",
            category: PaletteCategory::Shapes,
            description: "Rectangle shape",
            default_position: palette_origin(),
            default_size: Size::new(200.0, 150.0),
            default_style: Style {
                background_color: Some("#e5e7eb".to_string()),
                border_radius: Some(8.0),
                ..Style::default()
            },
            default_props: ComponentProps::Shape(ShapeProps {
                shape_type: ShapeType::Rectangle,
            }),
        });

        // Investment-specific
        self.register(ComponentDefinition {
            id: "risk-disclosure",
            name: "Risk Disclosure",
            category: PaletteCategory::Investment,
            description: "Risk disclosure box",
            default_position: palette_origin(),
            default_size: Size::new(700.0, 200.0),
            default_style: Style {
                background_color: Some("#fef3c7".to_string()),
                border_color: Some("#f59e0b".to_string()),
                border_width: Some(2.0),
                border_radius: Some(8.0),
                padding: Some(16.0),
                ..Style::default()
            },
            default_props: ComponentProps::Disclosure(DisclosureProps {
                title: "Risk Disclosure".to_string(),
                content: "Investments involve risk. Past performance does not guarantee future results."
                    .to_string(),
            }),
        });
    }
}

fn palette_origin() -> Position {
    Position::new(100.0, 100.0)
}

fn chart(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    chart_type: ChartType,
    size: Size,
    points: &[(&str, f64)],
) -> ComponentDefinition {
    ComponentDefinition {
        id,
        name,
        category: PaletteCategory::Charts,
        description,
        default_position: palette_origin(),
        default_size: size,
        default_style: Style::default(),
        default_props: ComponentProps::Chart(ChartProps {
            chart_type,
            data: points
                .iter()
                .map(|(name, value)| DataPoint::new(*name, *value))
                .collect(),
            title: None,
        }),
    }
}

fn text(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    size: Size,
    props: TextProps,
) -> ComponentDefinition {
    ComponentDefinition {
        id,
        name,
        category: PaletteCategory::Text,
        description,
        default_position: palette_origin(),
        default_size: size,
        default_style: Style::default(),
        default_props: ComponentProps::Text(props),
    }
}

fn columns(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    count: u32,
    width: f64,
) -> ComponentDefinition {
    ComponentDefinition {
        id,
        name,
        category: PaletteCategory::Layout,
        description,
        default_position: palette_origin(),
        default_size: Size::new(width, 400.0),
        default_style: Style::default(),
        default_props: ComponentProps::Layout(LayoutProps {
            columns: count,
            gap: 20.0,
        }),
    }
}
