// Donut chart generation for the analytics pane

use crate::analytics::CategorySlice;
use serde::Serialize;
use std::f64::consts::PI;

/// Default qualitative palette, cycled across slices
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A",
    "#19D3F3", "#FF6692", "#B6E880", "#FF97FF", "#FECB52",
];

const CENTER: f64 = 150.0;
const OUTER_RADIUS: f64 = 120.0;
const HOLE: f64 = 0.4;
// A full-circle arc has coincident endpoints and would not render
const MAX_SWEEP: f64 = 2.0 * PI - 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
    pub color: &'static str,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutChart {
    pub title: String,
    pub total: usize,
    pub slices: Vec<DonutSlice>,
}

impl DonutChart {
    /// Lay out slices clockwise from 12 o'clock, in input order.
    /// Zero-count slices take no arc and are left out.
    pub fn new(title: &str, data: &[CategorySlice]) -> Self {
        let total: usize = data.iter().map(|s| s.count).sum();
        let mut slices = Vec::with_capacity(data.len());
        let mut angle = 0.0;

        for (i, slice) in data.iter().enumerate() {
            if slice.count == 0 || total == 0 {
                continue;
            }
            let fraction = slice.count as f64 / total as f64;
            let sweep = (fraction * 2.0 * PI).min(MAX_SWEEP);

            slices.push(DonutSlice {
                label: slice.label.clone(),
                count: slice.count,
                percent: fraction * 100.0,
                color: PALETTE[i % PALETTE.len()],
                path: arc_path(angle, angle + sweep),
            });
            angle += sweep;
        }

        Self {
            title: title.to_string(),
            total,
            slices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Standalone SVG markup
    pub fn to_svg(&self) -> String {
        let size = CENTER * 2.0;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}" width="{size}" height="{size}">"#,
            size = size
        );
        for slice in &self.slices {
            svg.push_str(&format!(
                r#"<path d="{}" fill="{}" stroke="white" stroke-width="1"><title>{}: {} ({:.1}%)</title></path>"#,
                slice.path,
                slice.color,
                escape_xml(&slice.label),
                slice.count,
                slice.percent
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Point on a circle, angle measured clockwise from 12 o'clock
fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (CENTER + radius * angle.sin(), CENTER - radius * angle.cos())
}

fn arc_path(start: f64, end: f64) -> String {
    let inner_radius = OUTER_RADIUS * HOLE;
    let large_arc = if end - start > PI { 1 } else { 0 };

    let (ox0, oy0) = polar(OUTER_RADIUS, start);
    let (ox1, oy1) = polar(OUTER_RADIUS, end);
    let (ix1, iy1) = polar(inner_radius, end);
    let (ix0, iy0) = polar(inner_radius, start);

    format!(
        "M {:.2} {:.2} A {r:.2} {r:.2} 0 {la} 1 {:.2} {:.2} L {:.2} {:.2} A {ir:.2} {ir:.2} 0 {la} 0 {:.2} {:.2} Z",
        ox0, oy0, ox1, oy1, ix1, iy1, ix0, iy0,
        r = OUTER_RADIUS,
        ir = inner_radius,
        la = large_arc
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slice(label: &str, count: usize) -> CategorySlice {
        CategorySlice { label: label.to_string(), count }
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let chart = DonutChart::new("t", &[slice("Endangered", 1), slice("Vulnerable", 3)]);
        assert_eq!(chart.total, 4);
        assert_relative_eq!(chart.slices[0].percent, 25.0);
        assert_relative_eq!(chart.slices[1].percent, 75.0);
        assert_eq!(chart.slices[0].color, PALETTE[0]);
    }

    #[test]
    fn test_zero_slices_skipped() {
        let chart = DonutChart::new("t", &[slice("Extinct", 0), slice("Least Concern", 5)]);
        assert_eq!(chart.slices.len(), 1);
        assert!(chart.slices[0].path.starts_with("M 150.00 30.00"));
        assert!(DonutChart::new("t", &[]).is_empty());
    }

    #[test]
    fn test_svg_escapes_labels() {
        let chart = DonutChart::new("t", &[slice("Marine & Terrestrial", 2)]);
        let svg = chart.to_svg();
        assert!(svg.contains("Marine &amp; Terrestrial"));
        assert!(svg.ends_with("</svg>"));
    }
}
