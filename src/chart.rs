//! Chart Specs
//!
//! Turns result rows plus an axis choice into a Plotly figure description.
//! The directive either comes from the summary response (a fenced `json`
//! block) or from a heuristic when the question asks for a visual.

use crate::db::Row;
use crate::error::{CadetError, Result};
use crate::extract::{extract_block, JSON_TAG};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

lazy_static! {
    static ref CHART_TRIGGER: Regex = Regex::new(
        r"(?i)\b(plot(s|ted|ting)?|graph(s|ed|ing)?|chart(s|ed|ing)?|visuali[sz](e|es|ed|ing|ation))\b"
    )
    .unwrap();
    // Prefix match: share, shares, percent, percentage(s).
    static ref PROPORTION_WORDS: Regex = Regex::new(r"(?i)\b(share|percent)").unwrap();
}

/// Distinct x values below which a proportion question gets a pie chart.
pub const PIE_MAX_CATEGORIES: usize = 8;

/// Chart directive as emitted by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDirective {
    #[serde(alias = "chart_type")]
    pub plot_type: String,
    pub x_axis: String,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Fully resolved request handed to a [`ChartSpecBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub chart_type: String,
    pub x_axis: String,
    pub y_axis: String,
    pub title: String,
}

pub trait ChartSpecBuilder: Send + Sync {
    fn build(&self, rows: &[Row], request: &ChartRequest) -> Result<Value>;
}

/// Parse the first `json` block of `response` as a chart directive.
/// Missing block, bad JSON, or blank type / x axis all yield `None`.
pub fn parse_directive(response: &str) -> Option<ChartDirective> {
    let block = extract_block(response, JSON_TAG)?;
    let directive: ChartDirective = serde_json::from_str(&block).ok()?;
    if directive.plot_type.trim().is_empty() || directive.x_axis.trim().is_empty() {
        return None;
    }
    Some(directive)
}

pub fn has_chart_trigger(question: &str) -> bool {
    CHART_TRIGGER.is_match(question)
}

/// Column order of the result set, taken from the first row.
pub fn result_columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Pie for low-cardinality share/percentage questions, bar otherwise.
pub fn choose_chart_type(question: &str, rows: &[Row], x_axis: &str) -> &'static str {
    let distinct: HashSet<String> = rows
        .iter()
        .filter_map(|row| row.get(x_axis))
        .map(|v| v.to_string())
        .collect();

    if distinct.len() < PIE_MAX_CATEGORIES && PROPORTION_WORDS.is_match(question) {
        "pie"
    } else {
        "bar"
    }
}

impl ChartDirective {
    /// Fill in the y axis (last column other than x) and the title.
    pub fn resolve(self, rows: &[Row], question: &str) -> ChartRequest {
        let y_axis = self.y_axis.filter(|y| !y.trim().is_empty()).unwrap_or_else(|| {
            result_columns(rows)
                .into_iter()
                .rev()
                .find(|c| c != &self.x_axis)
                .unwrap_or_else(|| self.x_axis.clone())
        });
        ChartRequest {
            chart_type: self.plot_type.trim().to_lowercase(),
            x_axis: self.x_axis,
            y_axis,
            title: self.title.unwrap_or_else(|| question.trim().to_string()),
        }
    }
}

/// Heuristic request: only when the question asks for a visual and there are rows.
/// Uses the first column as x and the last as y.
pub fn heuristic_request(question: &str, rows: &[Row]) -> Option<ChartRequest> {
    if !has_chart_trigger(question) {
        return None;
    }
    let columns = result_columns(rows);
    let x_axis = columns.first()?.clone();
    let y_axis = columns.last()?.clone();
    Some(ChartRequest {
        chart_type: choose_chart_type(question, rows, &x_axis).to_string(),
        x_axis,
        y_axis,
        title: question.trim().to_string(),
    })
}

/// Builds Plotly figure JSON (`{data: [...], layout: {...}}`).
#[derive(Debug, Clone, Default)]
pub struct PlotlyChartBuilder;

impl PlotlyChartBuilder {
    pub fn new() -> Self {
        Self
    }

    fn column(rows: &[Row], name: &str) -> Result<Vec<Value>> {
        rows.iter()
            .map(|row| {
                row.get(name)
                    .cloned()
                    .ok_or_else(|| CadetError::Chart(format!("Column '{}' not found in result rows", name)))
            })
            .collect()
    }
}

/// SQLite often hands numbers back as text; coerce them where possible.
fn coerce_numeric(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Number(i.into());
            }
            match trimmed.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(s),
            }
        }
        other => other,
    }
}

impl ChartSpecBuilder for PlotlyChartBuilder {
    fn build(&self, rows: &[Row], request: &ChartRequest) -> Result<Value> {
        if rows.is_empty() {
            return Err(CadetError::Chart("No rows to chart".to_string()));
        }

        let x = Self::column(rows, &request.x_axis)?;
        let y: Vec<Value> = Self::column(rows, &request.y_axis)?
            .into_iter()
            .map(coerce_numeric)
            .collect();

        let trace = match request.chart_type.as_str() {
            "bar" => json!({
                "type": "bar",
                "x": x,
                "y": y,
                "texttemplate": "%{y}",
                "name": request.y_axis,
            }),
            "pie" => json!({
                "type": "pie",
                "labels": x,
                "values": y,
                "textposition": "inside",
                "textinfo": "percent+label",
            }),
            "line" => json!({
                "type": "scatter",
                "mode": "lines+markers",
                "x": x,
                "y": y,
                "name": request.y_axis,
            }),
            "scatter" => json!({
                "type": "scatter",
                "mode": "markers",
                "x": x,
                "y": y,
                "name": request.y_axis,
            }),
            other => {
                return Err(CadetError::Chart(format!("Unsupported chart type '{}'", other)));
            }
        };

        let mut layout = json!({ "title": { "text": request.title } });
        if request.chart_type != "pie" {
            layout["xaxis"] = json!({ "title": { "text": request.x_axis } });
            layout["yaxis"] = json!({ "title": { "text": request.y_axis } });
        }

        Ok(json!({ "data": [trace], "layout": layout }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(&str, f64)]) -> Vec<Row> {
        data.iter()
            .map(|(region, total)| {
                let mut row = Row::new();
                row.insert("region".to_string(), json!(region));
                row.insert("total".to_string(), json!(total));
                row
            })
            .collect()
    }

    #[test]
    fn test_parse_directive() {
        let response = "Summary.\n```json\n{\"plot_type\": \"line\", \"x_axis\": \"month\", \"y_axis\": \"revenue\", \"title\": \"Revenue\"}\n```";
        let directive = parse_directive(response).unwrap();
        assert_eq!(directive.plot_type, "line");
        assert_eq!(directive.y_axis.as_deref(), Some("revenue"));
    }

    #[test]
    fn test_parse_directive_requires_type_and_x() {
        assert!(parse_directive("no block here").is_none());
        assert!(parse_directive("```json\n{not json}\n```").is_none());
        assert!(parse_directive("```json\n{\"plot_type\": \"bar\"}\n```").is_none());
        assert!(parse_directive("```json\n{\"plot_type\": \"\", \"x_axis\": \"a\"}\n```").is_none());
        assert!(parse_directive("```json\n{\"chart_type\": \"pie\", \"x_axis\": \"a\"}\n```").is_some());
    }

    #[test]
    fn test_trigger_words() {
        assert!(has_chart_trigger("Plot revenue by month"));
        assert!(has_chart_trigger("show me a bar chart of sales"));
        assert!(has_chart_trigger("Can you visualize the churn?"));
        assert!(has_chart_trigger("graphs of orders"));
        assert!(has_chart_trigger("Plotting monthly churn"));
        assert!(!has_chart_trigger("Show total sales by region"));
        assert!(!has_chart_trigger("List chartered accountants by city"));
        assert!(!has_chart_trigger("Which plotters sold best?"));
    }

    #[test]
    fn test_chart_type_heuristic() {
        let data = rows(&[("West", 10.0), ("East", 5.0)]);
        assert_eq!(choose_chart_type("chart the share of sales by region", &data, "region"), "pie");
        assert_eq!(choose_chart_type("percentage of sales by region chart", &data, "region"), "pie");
        assert_eq!(choose_chart_type("chart sales by region", &data, "region"), "bar");
        assert_eq!(choose_chart_type("Chart the market shares by region", &data, "region"), "pie");
        assert_eq!(choose_chart_type("Chart percentages by region", &data, "region"), "pie");

        let many: Vec<(String, f64)> = (0..9).map(|i| (format!("r{}", i), i as f64)).collect();
        let many: Vec<(&str, f64)> = many.iter().map(|(r, v)| (r.as_str(), *v)).collect();
        let data = rows(&many);
        assert_eq!(choose_chart_type("percentage by region chart", &data, "region"), "bar");
    }

    #[test]
    fn test_heuristic_uses_first_and_last_columns() {
        let data = rows(&[("West", 10.0), ("East", 5.0)]);
        let request = heuristic_request("Make a chart of sales", &data).unwrap();
        assert_eq!(request.x_axis, "region");
        assert_eq!(request.y_axis, "total");
        assert_eq!(request.chart_type, "bar");
        assert!(heuristic_request("Show total sales by region", &data).is_none());
        assert!(heuristic_request("Plot it", &[]).is_none());
    }

    #[test]
    fn test_directive_resolve_defaults_y_axis() {
        let data = rows(&[("West", 10.0)]);
        let request = ChartDirective {
            plot_type: "Bar".to_string(),
            x_axis: "region".to_string(),
            y_axis: None,
            title: None,
        }
        .resolve(&data, "Sales by region");
        assert_eq!(request.chart_type, "bar");
        assert_eq!(request.y_axis, "total");
        assert_eq!(request.title, "Sales by region");
    }

    #[test]
    fn test_build_bar_and_pie() {
        let data = rows(&[("West", 10.0), ("East", 5.0)]);
        let builder = PlotlyChartBuilder::new();
        let bar = builder
            .build(&data, &ChartRequest {
                chart_type: "bar".into(),
                x_axis: "region".into(),
                y_axis: "total".into(),
                title: "Sales".into(),
            })
            .unwrap();
        assert_eq!(bar["data"][0]["type"], "bar");
        assert_eq!(bar["data"][0]["x"], json!(["West", "East"]));
        assert_eq!(bar["layout"]["title"]["text"], "Sales");

        let pie = builder
            .build(&data, &ChartRequest {
                chart_type: "pie".into(),
                x_axis: "region".into(),
                y_axis: "total".into(),
                title: "Share".into(),
            })
            .unwrap();
        assert_eq!(pie["data"][0]["labels"], json!(["West", "East"]));
        assert_eq!(pie["data"][0]["values"], json!([10.0, 5.0]));
    }

    #[test]
    fn test_build_coerces_numeric_strings() {
        let mut row = Row::new();
        row.insert("month".into(), json!("2024-01"));
        row.insert("revenue".into(), json!("1200.5"));
        let chart = PlotlyChartBuilder::new()
            .build(&[row], &ChartRequest {
                chart_type: "line".into(),
                x_axis: "month".into(),
                y_axis: "revenue".into(),
                title: "Revenue".into(),
            })
            .unwrap();
        assert_eq!(chart["data"][0]["y"], json!([1200.5]));
        assert_eq!(chart["data"][0]["mode"], "lines+markers");
    }

    #[test]
    fn test_build_failures() {
        let data = rows(&[("West", 10.0)]);
        let builder = PlotlyChartBuilder::new();
        let missing = ChartRequest {
            chart_type: "bar".into(),
            x_axis: "month".into(),
            y_axis: "total".into(),
            title: "t".into(),
        };
        assert!(matches!(builder.build(&data, &missing), Err(CadetError::Chart(_))));

        let unknown = ChartRequest { chart_type: "radar".into(), x_axis: "region".into(), ..missing.clone() };
        assert!(builder.build(&data, &unknown).is_err());
        assert!(builder.build(&[], &ChartRequest { x_axis: "region".into(), ..missing }).is_err());
    }
}
