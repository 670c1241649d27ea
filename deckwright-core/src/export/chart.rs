//! Chart part writer.
//!
//! One `c:chartSpace` per chart component, carrying a single series with
//! literal category and value caches so no embedded workbook is needed.

use crate::export::RenderError;
use crate::types::{ChartProps, ChartType};
use quick_xml::escape::escape;
use std::io::Write;

const CATEGORY_AXIS_ID: u32 = 111_111_111;
const VALUE_AXIS_ID: u32 = 222_222_222;

/// Check a chart can be written before any bytes are produced
pub fn validate_chart(chart: &ChartProps) -> Result<(), RenderError> {
    match chart.chart_type {
        ChartType::Pie | ChartType::Donut | ChartType::Line | ChartType::Bar => {}
        other => return Err(RenderError::UnsupportedChart(other.as_str())),
    }
    if chart.data.is_empty() {
        return Err(RenderError::EmptyChart);
    }
    if let Some(point) = chart.data.iter().find(|p| !p.value.is_finite()) {
        return Err(RenderError::NonFiniteValue(point.name.clone()));
    }
    Ok(())
}

/// Write a validated chart. `palette` holds bare `RRGGBB` colors used for
/// points without their own color.
pub fn write_chart<W: Write>(
    writer: &mut W,
    chart: &ChartProps,
    palette: &[String],
) -> std::io::Result<()> {
    write!(
        writer,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#
    )?;
    write!(
        writer,
        r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" "#
    )?;
    write!(
        writer,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#
    )?;
    write!(
        writer,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
    )?;
    write!(writer, r#"<c:date1904 val="0"/><c:lang val="en-US"/><c:roundedCorners val="0"/>"#)?;
    write!(writer, "<c:chart>")?;

    match &chart.title {
        Some(title) => {
            write_title(writer, title)?;
            write!(writer, r#"<c:autoTitleDeleted val="0"/>"#)?;
        }
        None => write!(writer, r#"<c:autoTitleDeleted val="1"/>"#)?,
    }

    write!(writer, "<c:plotArea><c:layout/>")?;
    match chart.chart_type {
        ChartType::Pie => {
            write!(writer, r#"<c:pieChart><c:varyColors val="1"/>"#)?;
            write_series(writer, chart, palette, true)?;
            write!(writer, r#"<c:firstSliceAng val="0"/></c:pieChart>"#)?;
        }
        ChartType::Donut => {
            write!(writer, r#"<c:doughnutChart><c:varyColors val="1"/>"#)?;
            write_series(writer, chart, palette, true)?;
            write!(
                writer,
                r#"<c:firstSliceAng val="0"/><c:holeSize val="50"/></c:doughnutChart>"#
            )?;
        }
        ChartType::Bar => {
            write!(
                writer,
                r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#
            )?;
            write_series(writer, chart, palette, false)?;
            write!(writer, r#"<c:gapWidth val="150"/>"#)?;
            write_axis_ids(writer)?;
            write!(writer, "</c:barChart>")?;
            write_axes(writer)?;
        }
        // validate_chart rejects everything else; anything that slips through
        // is drawn as a line
        _ => {
            write!(
                writer,
                r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#
            )?;
            write_series(writer, chart, palette, false)?;
            write!(writer, r#"<c:marker val="1"/>"#)?;
            write_axis_ids(writer)?;
            write!(writer, "</c:lineChart>")?;
            write_axes(writer)?;
        }
    }
    write!(writer, "</c:plotArea>")?;

    let legend_visible = matches!(chart.chart_type, ChartType::Pie | ChartType::Donut);
    if legend_visible {
        write!(
            writer,
            r#"<c:legend><c:legendPos val="r"/><c:overlay val="0"/></c:legend>"#
        )?;
    }
    write!(writer, r#"<c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/>"#)?;
    write!(writer, "</c:chart>")?;
    write!(writer, "</c:chartSpace>")?;

    Ok(())
}

fn write_title<W: Write>(writer: &mut W, title: &str) -> std::io::Result<()> {
    write!(writer, "<c:title><c:tx><c:rich>")?;
    write!(writer, "<a:bodyPr/><a:lstStyle/>")?;
    write!(writer, "<a:p><a:pPr><a:defRPr/></a:pPr>")?;
    write!(
        writer,
        r#"<a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r>"#,
        escape(title)
    )?;
    write!(writer, "</a:p></c:rich></c:tx>")?;
    write!(writer, r#"<c:overlay val="0"/></c:title>"#)?;
    Ok(())
}

fn write_series<W: Write>(
    writer: &mut W,
    chart: &ChartProps,
    palette: &[String],
    per_point_colors: bool,
) -> std::io::Result<()> {
    let count = chart.data.len();
    let point_color = |idx: usize| -> Option<String> {
        chart.data[idx]
            .color
            .as_deref()
            .and_then(crate::export::shapes::hex_color)
            .or_else(|| palette.get(idx % palette.len().max(1)).cloned())
    };

    write!(writer, r#"<c:ser><c:idx val="0"/><c:order val="0"/>"#)?;
    write!(
        writer,
        r#"<c:tx><c:v>{}</c:v></c:tx>"#,
        escape(chart.title.as_deref().unwrap_or("Series 1"))
    )?;

    if per_point_colors {
        for idx in 0..count {
            if let Some(color) = point_color(idx) {
                write!(
                    writer,
                    r#"<c:dPt><c:idx val="{}"/><c:bubble3D val="0"/><c:spPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill></c:spPr></c:dPt>"#,
                    idx, color
                )?;
            }
        }
    } else if let Some(color) = point_color(0) {
        write!(
            writer,
            r#"<c:spPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill></c:spPr>"#,
            color
        )?;
    }

    write!(writer, r#"<c:cat><c:strLit><c:ptCount val="{}"/>"#, count)?;
    for (idx, point) in chart.data.iter().enumerate() {
        write!(
            writer,
            r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#,
            idx,
            escape(point.name.as_str())
        )?;
    }
    write!(writer, "</c:strLit></c:cat>")?;

    write!(writer, r#"<c:val><c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#, count)?;
    for (idx, point) in chart.data.iter().enumerate() {
        write!(writer, r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, idx, point.value)?;
    }
    write!(writer, "</c:numLit></c:val>")?;

    if chart.chart_type == ChartType::Line {
        write!(writer, r#"<c:smooth val="0"/>"#)?;
    }
    write!(writer, "</c:ser>")?;
    Ok(())
}

fn write_axis_ids<W: Write>(writer: &mut W) -> std::io::Result<()> {
    write!(
        writer,
        r#"<c:axId val="{}"/><c:axId val="{}"/>"#,
        CATEGORY_AXIS_ID, VALUE_AXIS_ID
    )
}

fn write_axes<W: Write>(writer: &mut W) -> std::io::Result<()> {
    write!(
        writer,
        r#"<c:catAx><c:axId val="{}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="b"/><c:numFmt formatCode="General" sourceLinked="0"/><c:tickLblPos val="nextTo"/><c:crossAx val="{}"/><c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/></c:catAx>"#,
        CATEGORY_AXIS_ID, VALUE_AXIS_ID
    )?;
    write!(
        writer,
        r#"<c:valAx><c:axId val="{}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="l"/><c:majorGridlines/><c:numFmt formatCode="General" sourceLinked="0"/><c:tickLblPos val="nextTo"/><c:crossAx val="{}"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>"#,
        VALUE_AXIS_ID, CATEGORY_AXIS_ID
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::charts::parse_chart;
    use crate::types::DataPoint;

    fn chart(chart_type: ChartType) -> ChartProps {
        ChartProps {
            chart_type,
            data: vec![DataPoint::new("Stocks", 60.0), DataPoint::new("Bonds & Cash", 40.0)],
            title: Some("Allocation".to_string()),
        }
    }

    fn render(chart: &ChartProps) -> String {
        let mut bytes = Vec::new();
        write_chart(&mut bytes, chart, &["22C55E".to_string()]).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn doughnut_has_hole() {
        let xml = render(&chart(ChartType::Donut));
        assert!(xml.contains("<c:doughnutChart>"));
        assert!(xml.contains(r#"<c:holeSize val="50"/>"#));
        assert!(xml.contains("Bonds &amp; Cash"));
    }

    #[test]
    fn written_chart_reads_back() {
        for chart_type in [ChartType::Pie, ChartType::Donut, ChartType::Bar, ChartType::Line] {
            let original = chart(chart_type);
            let parsed = parse_chart(&render(&original)).unwrap();
            assert_eq!(parsed, original, "{}", chart_type.as_str());
        }
    }

    #[test]
    fn validation_rejects_bad_data() {
        let mut empty = chart(ChartType::Pie);
        empty.data.clear();
        assert!(matches!(validate_chart(&empty), Err(RenderError::EmptyChart)));

        let mut nan = chart(ChartType::Bar);
        nan.data[1].value = f64::NAN;
        assert!(matches!(validate_chart(&nan), Err(RenderError::NonFiniteValue(name)) if name == "Bonds & Cash"));

        assert!(matches!(
            validate_chart(&chart(ChartType::Heatmap)),
            Err(RenderError::UnsupportedChart("heatmap"))
        ));
    }
}
