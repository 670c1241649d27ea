//! Chart part reading. Only the first series of the first chart group is
//! kept; that is all the editor's chart component can hold.

use crate::error::PartError;
use crate::types::{ChartProps, ChartType, DataPoint};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Category,
    Value,
    Title,
}

pub fn parse_chart(xml: &str) -> Result<ChartProps, PartError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut chart_type: Option<ChartType> = None;
    let mut series_seen = 0usize;
    let mut section: Option<Section> = None;
    let mut point_index: Option<usize> = None;
    let mut in_value = false;
    let mut categories: BTreeMap<usize, String> = BTreeMap::new();
    let mut values: BTreeMap<usize, f64> = BTreeMap::new();
    let mut title = String::new();

    loop {
        let event = reader.read_event().map_err(|source| PartError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"pieChart" | b"pie3DChart" => set_once(&mut chart_type, ChartType::Pie),
                b"doughnutChart" => set_once(&mut chart_type, ChartType::Donut),
                b"barChart" | b"bar3DChart" => set_once(&mut chart_type, ChartType::Bar),
                b"lineChart" | b"line3DChart" | b"areaChart" => {
                    set_once(&mut chart_type, ChartType::Line)
                }
                b"scatterChart" => set_once(&mut chart_type, ChartType::Scatter),
                b"ser" => series_seen += 1,
                b"cat" | b"xVal" if series_seen == 1 => section = Some(Section::Category),
                b"val" | b"yVal" if series_seen == 1 => section = Some(Section::Value),
                b"title" if series_seen == 0 => section = Some(Section::Title),
                b"pt" => {
                    point_index = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"idx")
                        .and_then(|a| a.unescape_value().ok())
                        .and_then(|v| v.parse().ok());
                }
                b"v" => in_value = true,
                _ => {}
            },
            Event::Text(t) => {
                let text = t.unescape().map_err(|source| PartError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                match (section, point_index) {
                    (Some(Section::Category), Some(idx)) if in_value => {
                        categories.insert(idx, text.into_owned());
                    }
                    (Some(Section::Value), Some(idx)) if in_value => {
                        if let Ok(value) = text.trim().parse::<f64>() {
                            values.insert(idx, value);
                        }
                    }
                    (Some(Section::Title), _) => title.push_str(&text),
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"cat" | b"val" | b"xVal" | b"yVal" | b"title" => section = None,
                b"pt" => point_index = None,
                b"v" => in_value = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let data = values
        .into_iter()
        .map(|(idx, value)| {
            let name = categories
                .remove(&idx)
                .unwrap_or_else(|| format!("Item {}", idx + 1));
            DataPoint::new(name, value)
        })
        .collect();

    Ok(ChartProps {
        chart_type: chart_type.unwrap_or(ChartType::Bar),
        data,
        title: Some(title.trim().to_string()).filter(|t| !t.is_empty()),
    })
}

fn set_once(slot: &mut Option<ChartType>, chart_type: ChartType) {
    if slot.is_none() {
        *slot = Some(chart_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_series_of_doughnut() {
        let xml = r#"<c:chartSpace xmlns:c="c" xmlns:a="a"><c:chart>
<c:title><c:tx><c:rich><a:p><a:r><a:t>Allocation</a:t></a:r></a:p></c:rich></c:tx></c:title>
<c:plotArea><c:doughnutChart>
  <c:ser><c:idx val="0"/>
    <c:cat><c:strRef><c:strCache><c:ptCount val="2"/>
      <c:pt idx="0"><c:v>Stocks</c:v></c:pt><c:pt idx="1"><c:v>Bonds</c:v></c:pt>
    </c:strCache></c:strRef></c:cat>
    <c:val><c:numRef><c:numCache><c:ptCount val="2"/>
      <c:pt idx="0"><c:v>60</c:v></c:pt><c:pt idx="1"><c:v>40.5</c:v></c:pt>
    </c:numCache></c:numRef></c:val>
  </c:ser>
  <c:ser><c:idx val="1"/>
    <c:val><c:numRef><c:numCache><c:pt idx="0"><c:v>999</c:v></c:pt></c:numCache></c:numRef></c:val>
  </c:ser>
</c:doughnutChart></c:plotArea></c:chart></c:chartSpace>"#;

        let chart = parse_chart(xml).unwrap();
        assert_eq!(chart.chart_type, ChartType::Donut);
        assert_eq!(chart.title.as_deref(), Some("Allocation"));
        assert_eq!(
            chart.data,
            vec![DataPoint::new("Stocks", 60.0), DataPoint::new("Bonds", 40.5)]
        );
    }

    #[test]
    fn missing_categories_get_positional_names() {
        let xml = r#"<c:chartSpace xmlns:c="c"><c:chart><c:plotArea><c:lineChart><c:ser>
<c:val><c:numRef><c:numCache><c:pt idx="0"><c:v>1</c:v></c:pt><c:pt idx="1"><c:v>2</c:v></c:pt></c:numCache></c:numRef></c:val>
</c:ser></c:lineChart></c:plotArea></c:chart></c:chartSpace>"#;

        let chart = parse_chart(xml).unwrap();
        assert_eq!(chart.chart_type, ChartType::Line);
        assert_eq!(chart.data[1].name, "Item 2");
        assert_eq!(chart.title, None);
    }
}
