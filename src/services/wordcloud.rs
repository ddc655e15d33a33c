use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::Keyword,
};

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_VALUE: f64 = 50.0;
const DEFAULT_CATEGORY: &str = "Other";

/// Coerces loosely-typed keyword objects from the model into [`Keyword`]s
///
/// Missing, empty or zero fields fall back to defaults. Numeric strings are
/// accepted for `value`.
pub fn normalize_keywords(raw: &[Value]) -> Vec<Keyword> {
    raw.iter().map(normalize_keyword).collect()
}

fn normalize_keyword(item: &Value) -> Keyword {
    let name = text_or(&item["name"], DEFAULT_NAME);
    let category = text_or(&item["category"], DEFAULT_CATEGORY);

    let value = match &item["value"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite() && *v != 0.0)
    .unwrap_or(DEFAULT_VALUE);

    Keyword {
        name,
        value,
        category,
    }
}

fn text_or(value: &Value, default: &str) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => default.to_string(),
    }
}

/// Builds the ECharts option for a `wordCloud` series
pub fn chart_option(keywords: &[Keyword]) -> AppResult<Value> {
    if keywords.is_empty() {
        return Err(AppError::InvalidInput(
            "Invalid data for word cloud visualization".to_string(),
        ));
    }

    let data: Vec<Value> = keywords.iter().map(data_item).collect();

    Ok(json!({
        "tooltip": {
            "show": true,
            "formatter": "{b}"
        },
        "series": [{
            "type": "wordCloud",
            "shape": "circle",
            "left": "center",
            "top": "center",
            "width": "90%",
            "height": "90%",
            "right": null,
            "bottom": null,
            "sizeRange": [12, 60],
            "rotationRange": [-90, 90],
            "rotationStep": 45,
            "gridSize": 8,
            "drawOutOfBound": false,
            "textStyle": {
                "fontFamily": "Courier, monospace",
                "fontWeight": "bold",
                "color": "#000000"
            },
            "emphasis": {
                "focus": "self",
                "textStyle": {
                    "shadowBlur": 10,
                    "shadowColor": "#333"
                }
            },
            "data": data
        }]
    }))
}

// ECharts string formatters cannot reach custom data fields, so the category
// line is rendered per item.
fn data_item(keyword: &Keyword) -> Value {
    json!({
        "name": keyword.name,
        "value": keyword.value,
        "category": keyword.category,
        "tooltip": {
            "formatter": format!("{}<br/>Category: {}", keyword.name, keyword.category)
        }
    })
}

/// Keywords heaviest first, for a plain-text cloud in the terminal
pub fn ranked(keywords: &[Keyword]) -> Vec<&Keyword> {
    let mut ranked: Vec<&Keyword> = keywords.iter().collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    ranked
}
