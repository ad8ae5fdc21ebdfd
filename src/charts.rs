//! Server-side SVG line charts for the dashboard page.

use crate::report::MetricSeries;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 240.0;
const MARGIN: f64 = 36.0;

/// Render one metric series as an inline SVG line chart.
pub fn line_chart(series: &MetricSeries, dates: &[String]) -> String {
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="{label} over time">"#,
        w = WIDTH,
        h = HEIGHT,
        label = series.label,
    );

    svg.push_str(&format!(
        r#"<text x="{}" y="18" text-anchor="middle" font-size="14">{} Over Time</text>"#,
        WIDTH / 2.0,
        series.label
    ));

    // Axes
    svg.push_str(&format!(
        r##"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" stroke="#999"/><line x1="{m}" y1="{t}" x2="{m}" y2="{b}" stroke="#999"/>"##,
        m = MARGIN,
        t = MARGIN,
        b = HEIGHT - MARGIN,
        r = WIDTH - MARGIN,
    ));

    if series.values.is_empty() {
        svg.push_str(&format!(
            r##"<text x="{}" y="{}" text-anchor="middle" font-size="12" fill="#666">No data</text>"##,
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        svg.push_str("</svg>");
        return svg;
    }

    let max = series.values.iter().cloned().fold(0.0_f64, f64::max);
    // A flat all-zero series still needs a finite scale.
    let scale = if max > 0.0 { max } else { 1.0 };

    let points: Vec<String> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if series.values.len() > 1 {
                MARGIN + plot_w * i as f64 / (series.values.len() - 1) as f64
            } else {
                MARGIN + plot_w / 2.0
            };
            let y = HEIGHT - MARGIN - plot_h * (v / scale);
            format!("{:.1},{:.1}", x, y)
        })
        .collect();

    svg.push_str(&format!(
        r##"<polyline fill="none" stroke="#1a73e8" stroke-width="2" points="{}"/>"##,
        points.join(" ")
    ));

    // Y extent and first/last date labels
    svg.push_str(&format!(
        r#"<text x="{x}" y="{t}" text-anchor="end" font-size="10">{max}</text><text x="{x}" y="{b}" text-anchor="end" font-size="10">0</text>"#,
        x = MARGIN - 4.0,
        t = MARGIN + 4.0,
        b = HEIGHT - MARGIN,
        max = max,
    ));
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        svg.push_str(&format!(
            r#"<text x="{m}" y="{y}" text-anchor="start" font-size="10">{first}</text><text x="{r}" y="{y}" text-anchor="end" font-size="10">{last}</text>"#,
            m = MARGIN,
            r = WIDTH - MARGIN,
            y = HEIGHT - MARGIN + 14.0,
            first = first,
            last = last,
        ));
    }

    svg.push_str("</svg>");
    svg
}
