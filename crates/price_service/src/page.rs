//! Server-rendered dashboard page

use std::fmt::Write;

use url::form_urlencoded::byte_serialize;

use crate::errors::FAILURE_HINT;
use crate::predictor::{MarketOptions, PredictionReport};
use crate::trends::PriceComparison;

const STYLE: &str = r#"
    <style>
        body {
            font-family: Arial, sans-serif;
            max-width: 860px;
            margin: 40px auto;
            padding: 20px;
            background: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            border-bottom: 3px solid #4CAF50;
            padding-bottom: 10px;
        }
        label { display: block; margin-top: 12px; color: #444; }
        input, select { padding: 6px; min-width: 240px; }
        .markets a { margin-right: 12px; }
        .markets a.active { font-weight: bold; color: #4CAF50; }
        .price { font-size: 1.6em; color: #2e7d32; }
        .error { padding: 12px; background: #fdecea; border-left: 4px solid #d32f2f; }
        .hint { color: #666; }
        .warning { padding: 12px; background: #fff8e1; border-left: 4px solid #f9a825; }
        .info { padding: 12px; background: #e8f5e9; border-left: 4px solid #4CAF50; }
        code { background: #f4f4f4; padding: 2px 6px; border-radius: 3px; }
    </style>"#;

/// Values echoed back into the form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    pub date: String,
    pub vegetable: String,
    pub variety: String,
    pub province: String,
    pub temperature: String,
    pub rainfall: String,
    pub production_kg: String,
    pub retrain: bool,
}

impl FormValues {
    /// First class of each select and the market's default weather
    pub fn defaults(options: &MarketOptions, date: chrono::NaiveDate) -> Self {
        let first = |classes: &[String]| classes.first().cloned().unwrap_or_default();
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            vegetable: first(&options.vegetables),
            variety: first(&options.varieties),
            province: first(&options.provinces),
            temperature: options.default_temperature.to_string(),
            rainfall: options.default_rainfall.to_string(),
            production_kg: String::new(),
            retrain: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Report(Box<PredictionReport>),
    Failure(String),
}

pub struct DashboardView<'a> {
    pub markets: &'a [String],
    pub options: &'a MarketOptions,
    pub form: &'a FormValues,
    pub outcome: Option<&'a Outcome>,
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Query-string encoding for market links
fn select(out: &mut String, name: &str, label: &str, classes: &[String], selected: &str) {
    let _ = write!(out, r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">"#);
    for class in classes {
        let class = escape_html(class);
        let mark = if class == escape_html(selected) { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{class}"{mark}>{class}</option>"#);
    }
    out.push_str("</select>");
}

fn input(out: &mut String, name: &str, label: &str, kind: &str, value: &str) {
    let _ = write!(
        out,
        r#"<label for="{name}">{label}</label><input id="{name}" name="{name}" type="{kind}" step="any" value="{}">"#,
        escape_html(value)
    );
}

/// Two-bar chart of predicted vs historical average price
pub fn comparison_chart(comparison: &PriceComparison) -> String {
    const WIDTH: f64 = 320.0;
    const HEIGHT: f64 = 200.0;
    const BAR: f64 = 90.0;

    let top = comparison.predicted.max(comparison.historical).max(f64::EPSILON);
    let bar = |x: f64, value: f64, color: &str, label: &str| {
        let h = (value.max(0.0) / top) * (HEIGHT - 40.0);
        let y = HEIGHT - 20.0 - h;
        format!(
            r#"<rect x="{x}" y="{y:.1}" width="{BAR}" height="{h:.1}" fill="{color}"/><text x="{tx}" y="{ty:.1}" text-anchor="middle" font-size="12">{value:.2}</text><text x="{tx}" y="{ly}" text-anchor="middle" font-size="12">{label}</text>"#,
            tx = x + BAR / 2.0,
            ty = y - 4.0,
            ly = HEIGHT - 4.0,
        )
    };

    format!(
        r#"<svg class="chart" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg">{}{}</svg>"#,
        bar(40.0, comparison.predicted, "#4CAF50", "Predicted"),
        bar(190.0, comparison.historical, "#90A4AE", "Historical avg"),
    )
}

fn render_report(out: &mut String, report: &PredictionReport) {
    let _ = write!(
        out,
        r#"<h2>Prediction</h2><p class="price">Predicted price on {}: Rs. {:.2}</p>"#,
        report.date.format("%Y-%m-%d"),
        report.price
    );

    if let Some(comparison) = &report.comparison {
        let _ = write!(
            out,
            "<h3>{} ({}) vs historical average</h3>{}",
            escape_html(&report.vegetable),
            escape_html(&report.variety),
            comparison_chart(comparison)
        );
    }

    if let Some(entry) = &report.ledger_entry {
        let _ = write!(
            out,
            r#"<p class="info">Recorded {} kg of {} for {} in {}.</p>"#,
            entry.kg,
            escape_html(&entry.vegetable),
            escape_html(&entry.market),
            entry.year
        );
    }

    if let Some(assessment) = &report.oversupply {
        if assessment.oversupplied {
            let _ = write!(
                out,
                r#"<div class="warning"><strong>Oversupply risk:</strong> {} kg planned for {} against a usual {} kg."#,
                assessment.total_kg, assessment.year, assessment.average_kg
            );
            if !assessment.alternatives.is_empty() {
                out.push_str("<p>Consider instead:</p><ul>");
                for alt in &assessment.alternatives {
                    let _ = write!(
                        out,
                        "<li>{} ({}): Rs. {:.2} average</li>",
                        escape_html(&alt.vegetable),
                        escape_html(&alt.variety),
                        alt.avg_price
                    );
                }
                out.push_str("</ul>");
            }
            out.push_str("</div>");
        } else {
            let _ = write!(
                out,
                r#"<p class="info">Planned supply for {} is {} kg, below the usual {} kg.</p>"#,
                assessment.year, assessment.total_kg, assessment.average_kg
            );
        }
    }

    if let Some(summary) = &report.retrain {
        let _ = write!(
            out,
            r#"<p class="info">Model retrained on {} rows (hash <code>{}</code>).</p>"#,
            summary.training_rows, summary.model_hash
        );
    }
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let options = view.options;
    let form = view.form;
    let mut out = String::with_capacity(8 * 1024);

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>Vegetable Price Prediction</title>{STYLE}\n</head>\n<body>\n<div class=\"container\">\n<h1>Vegetable Price Prediction</h1>"
    );

    out.push_str(r#"<p class="markets">Market: "#);
    for market in view.markets {
        let class = if *market == options.market { " class=\"active\"" } else { "" };
        let _ = write!(
            out,
            r#"<a href="/?market={}"{class}>{}</a>"#,
            byte_serialize(market.as_bytes()).collect::<String>(),
            escape_html(market)
        );
    }
    out.push_str("</p>");

    let _ = write!(
        out,
        r#"<form method="post" action="/predict"><input type="hidden" name="market" value="{}">"#,
        escape_html(&options.market)
    );
    input(&mut out, "date", "Date", "date", &form.date);
    select(&mut out, "vegetable", "Vegetable", &options.vegetables, &form.vegetable);
    select(&mut out, "variety", "Variety", &options.varieties, &form.variety);
    select(&mut out, "province", "Province", &options.provinces, &form.province);
    input(&mut out, "temperature", "Temperature (°C)", "number", &form.temperature);
    input(&mut out, "rainfall", "Rainfall (mm)", "number", &form.rainfall);
    input(&mut out, "production_kg", "Planned production (kg, optional)", "number", &form.production_kg);
    let _ = write!(
        out,
        r#"<label><input type="checkbox" name="retrain" value="on"{}> Retrain the model with this prediction</label>"#,
        if form.retrain { " checked" } else { "" }
    );
    out.push_str(r#"<p><button type="submit">Predict price</button></p></form>"#);

    match view.outcome {
        Some(Outcome::Report(report)) => render_report(&mut out, report),
        Some(Outcome::Failure(message)) => {
            let _ = write!(
                out,
                r#"<div class="error"><p>{}</p><p class="hint">{}</p></div>"#,
                escape_html(message),
                FAILURE_HINT
            );
        }
        None => {}
    }

    out.push_str("\n</div>\n</body>\n</html>\n");
    out
}
