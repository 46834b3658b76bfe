//! Inline SVG line charts for backtest results.

const WIDTH: f64 = 500.0;
const HEIGHT: f64 = 200.0;
const PADDING: f64 = 40.0;

/// Polyline chart of `values` in sequence order, with min and max labels on
/// the y axis.
pub fn line_chart_svg(caption: &str, values: &[f64], stroke: &str) -> String {
    if values.is_empty() {
        return format!("<p class=\"empty\">No {} data available.</p>", caption.to_lowercase());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if values.len() > 1 {
        plot_width / (values.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = PADDING + i as f64 * scale_x;
            let y = if range > 0.0 {
                HEIGHT - PADDING - (value - min) * scale_y
            } else {
                HEIGHT / 2.0
            };
            format!("{x:.1},{y:.1}")
        })
        .collect();

    format!(
        concat!(
            "<svg class=\"chart\" viewBox=\"0 0 {w:.0} {h:.0}\" width=\"{w:.0}\" height=\"{h:.0}\" ",
            "role=\"img\" aria-label=\"{caption}\" xmlns=\"http://www.w3.org/2000/svg\">",
            "<line x1=\"{p:.0}\" y1=\"{p:.0}\" x2=\"{p:.0}\" y2=\"{base:.0}\" stroke=\"#888\"/>",
            "<line x1=\"{p:.0}\" y1=\"{base:.0}\" x2=\"{right:.0}\" y2=\"{base:.0}\" stroke=\"#888\"/>",
            "<text x=\"4\" y=\"{p:.0}\" font-size=\"10\">{max:.2}</text>",
            "<text x=\"4\" y=\"{base:.0}\" font-size=\"10\">{min:.2}</text>",
            "<polyline fill=\"none\" stroke=\"{stroke}\" stroke-width=\"1.5\" points=\"{points}\"/>",
            "</svg>"
        ),
        w = WIDTH,
        h = HEIGHT,
        p = PADDING,
        base = HEIGHT - PADDING,
        right = WIDTH - PADDING,
        caption = caption,
        max = max,
        min = min,
        stroke = stroke,
        points = points.join(" "),
    )
}
