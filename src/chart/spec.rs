//! Typed Vega-Lite specification.
//!
//! Only the subset of the grammar the dashboard emits is modelled. Every
//! optional property is skipped when unset so the JSON stays close to what a
//! hand-written spec would contain.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::DashboardResult;

/// Vega-Lite schema the client-side renderer is pinned to.
pub const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v4.8.1.json";

/// A complete chart: inline data plus the root view.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: &'static str,

    pub data: Data,

    #[serde(flatten)]
    pub view: View,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

impl ChartSpec {
    /// Serialize `rows` as inline data values for `view`.
    pub fn new<R: Serialize>(rows: &[R], view: View) -> DashboardResult<Self> {
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(Self {
            schema: SCHEMA,
            data: Data { values },
            view,
            config: None,
        })
    }

    /// Suppress legend titles; the color fields are synthetic labels.
    pub fn without_legend_title(mut self) -> Self {
        self.config = Some(Config {
            legend: LegendConfig { title: None },
        });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Data {
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub legend: LegendConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendConfig {
    pub title: Option<String>,
}

/// A unit, layered or vertically concatenated view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct View {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<Mark>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layer: Vec<View>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vconcat: Vec<View>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub selection: BTreeMap<String, Selection>,
}

impl View {
    pub fn unit(mark: Mark, encoding: Encoding) -> Self {
        Self {
            mark: Some(mark),
            encoding: Some(encoding),
            ..Default::default()
        }
    }

    pub fn layered(layers: Vec<View>) -> Self {
        Self {
            layer: layers,
            ..Default::default()
        }
    }

    pub fn vconcat(views: Vec<View>) -> Self {
        Self {
            vconcat: views,
            ..Default::default()
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a named selection. On a concatenation it lands on the first
    /// child, where Vega-Lite allows selections to be defined.
    pub fn select(mut self, name: &str, selection: Selection) -> Self {
        match self.vconcat.first_mut() {
            Some(first) => {
                first.selection.insert(name.to_string(), selection);
            }
            None => {
                self.selection.insert(name.to_string(), selection);
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Line,
    Bar,
}

/// Point overlay on a line mark.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PointStyle {
    Enabled(bool),
    Styled { color: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<PointStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Mark {
    fn of(kind: MarkKind) -> Self {
        Self {
            kind,
            point: None,
            clip: None,
            color: None,
        }
    }

    pub fn line() -> Self {
        Self::of(MarkKind::Line)
    }

    pub fn bar() -> Self {
        Self::of(MarkKind::Bar)
    }

    pub fn with_points(mut self) -> Self {
        self.point = Some(PointStyle::Enabled(true));
        self
    }

    pub fn with_point_color(mut self, color: &str) -> Self {
        self.point = Some(PointStyle::Styled {
            color: color.to_string(),
        });
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Set clipping; `false` leaves the property unset.
    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = clip.then_some(true);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Channel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Channel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Channel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<ConditionalValue>,
}

impl Encoding {
    pub fn xy(x: Channel, y: Channel) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: Channel) -> Self {
        self.color = Some(color);
        self
    }

    pub fn opacity(mut self, opacity: ConditionalValue) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Temporal,
    Quantitative,
    Nominal,
}

/// A field-bound encoding channel.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub field: String,

    #[serde(rename = "type")]
    pub kind: FieldType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
}

impl Channel {
    pub fn new(field: &str, kind: FieldType) -> Self {
        Self {
            field: field.to_string(),
            kind,
            title: None,
            scale: None,
        }
    }

    pub fn temporal(field: &str) -> Self {
        Self::new(field, FieldType::Temporal)
    }

    pub fn quantitative(field: &str) -> Self {
        Self::new(field, FieldType::Quantitative)
    }

    pub fn nominal(field: &str) -> Self {
        Self::new(field, FieldType::Nominal)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Pin the axis to `[0, max]` when a maximum is known.
    pub fn zero_to(self, max: Option<f64>) -> Self {
        match max {
            Some(max) => self.scale(Scale::numeric(0.0, max)),
            None => self,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Domain {
    Numeric(Vec<f64>),
    Labels(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Scale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<String>>,
}

impl Scale {
    pub fn numeric(min: f64, max: f64) -> Self {
        Self {
            domain: Some(Domain::Numeric(vec![min, max])),
            range: None,
        }
    }

    /// Fixed label → color mapping.
    pub fn categorical(labels: &[&str], colors: &[&str]) -> Self {
        Self {
            domain: Some(Domain::Labels(labels.iter().map(|l| l.to_string()).collect())),
            range: Some(colors.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// Interactive selection definition.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub fields: Vec<String>,
    pub bind: &'static str,
}

impl Selection {
    /// Multi-select on `field`, toggled by clicking legend entries.
    pub fn legend_multi(field: &str) -> Self {
        Self {
            kind: "multi",
            fields: vec![field.to_string()],
            bind: "legend",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionCondition {
    pub selection: String,
    pub value: f64,
}

/// `value` normally, `condition.value` for selected data.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionalValue {
    pub condition: SelectionCondition,
    pub value: f64,
}

impl ConditionalValue {
    pub fn when_selected(selection: &str, selected: f64, otherwise: f64) -> Self {
        Self {
            condition: SelectionCondition {
                selection: selection.to_string(),
                value: selected,
            },
            value: otherwise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row {
        dt: &'static str,
        cases: Option<f64>,
    }

    #[test]
    fn test_unit_view_serialization() {
        let rows = [
            Row { dt: "2020-03-01", cases: Some(1.0) },
            Row { dt: "2020-03-02", cases: None },
        ];
        let view = View::unit(
            Mark::line().with_points().clip(true),
            Encoding::xy(
                Channel::temporal("dt").title("Date"),
                Channel::quantitative("cases").zero_to(Some(4.0)),
            ),
        )
        .size(500, 200)
        .title("Cases");

        let spec = ChartSpec::new(&rows, view).unwrap().without_legend_title();
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(value["$schema"], SCHEMA);
        assert_eq!(value["data"]["values"][1]["cases"], Value::Null);
        assert_eq!(value["mark"], json!({"type": "line", "point": true, "clip": true}));
        assert_eq!(
            value["encoding"]["y"],
            json!({"field": "cases", "type": "quantitative", "scale": {"domain": [0.0, 4.0]}})
        );
        assert_eq!(value["width"], 500);
        assert_eq!(value["title"], "Cases");
        assert_eq!(value["config"], json!({"legend": {"title": null}}));
        assert!(value.get("layer").is_none());
        assert!(value.get("selection").is_none());
    }

    #[test]
    fn test_selection_lands_on_first_concatenated_view() {
        let child = || View::unit(Mark::line(), Encoding::default());
        let view = View::vconcat(vec![child(), child()])
            .select("pick", Selection::legend_multi("state"));

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value["vconcat"][0]["selection"]["pick"],
            json!({"type": "multi", "fields": ["state"], "bind": "legend"})
        );
        assert!(value["vconcat"][1].get("selection").is_none());
    }

    #[test]
    fn test_styled_point_and_conditional_opacity() {
        let encoding = Encoding::default()
            .opacity(ConditionalValue::when_selected("pick", 1.0, 0.2));
        let view = View::unit(
            Mark::line().with_point_color("lightgrey").color("lightgrey"),
            encoding,
        );

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["mark"]["point"], json!({"color": "lightgrey"}));
        assert_eq!(
            value["encoding"]["opacity"],
            json!({"condition": {"selection": "pick", "value": 1.0}, "value": 0.2})
        );
    }
}
