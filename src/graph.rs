use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Width of the logical drawing canvas
pub const CANVAS_WIDTH: f64 = 600.0;
/// Height of the logical drawing canvas
pub const CANVAS_HEIGHT: f64 = 350.0;

/// One billion, the unit of the vertical axis
pub const BILLION: f64 = 1e9;

/// Radius of the invisible hover target around each line point
pub const HIT_RADIUS: f64 = 8.0;
const POINT_RADIUS: f64 = 3.0;
const POINT_RADIUS_HOVERED: f64 = 5.0;

/// Share of a record's slot used by its pair of bars
const BAR_GROUP_RATIO: f64 = 0.8;
/// Share of the bar group used by a single bar
const BAR_RATIO: f64 = 0.4;
const BAR_HOVER_GROWTH: f64 = 2.0;

/// Most grid intervals drawn on the vertical axis
pub const MAX_GRID_INTERVALS: usize = 20;

/// Maximum number of x-axis labels before thinning kicks in
const MAX_UNTHINNED_LABELS: usize = 10;
/// Approximate number of x-axis labels kept after thinning
const THINNED_LABELS: usize = 8;

/// A plotted series: record key, display label and colours
#[derive(Clone, Copy, Debug)]
pub struct Series {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub hover_color: &'static str,
}

/// The two series every chart draws, in drawing order
pub const SERIES: [Series; 2] = [
    Series {
        key: "india",
        label: "India",
        color: "#3b82f6",
        hover_color: "#1d4ed8",
    },
    Series {
        key: "world",
        label: "World",
        color: "#10b981",
        hover_color: "#047857",
    },
];

/// Available chart types supported by the dashboard
///
/// This enum defines the visualization formats the renderer can produce
/// from normalized records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Line chart - two smoothed curves, the first one filled down to the axis
    #[default]
    Line,

    /// Bar chart - two side-by-side bars per record
    Bar,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
        })
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            other => Err(format!("Unknown chart type: {}", other)),
        }
    }
}

/// Space kept free around the plotting area
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Which record, if any, the pointer is over
///
/// Hover is exclusive: entering a record replaces whatever was hovered
/// before, leaving clears it. The renderer derives every highlight attribute
/// from this value on each draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverState {
    hovered: Option<usize>,
}

impl HoverState {
    pub fn new(hovered: Option<usize>) -> Self {
        Self { hovered }
    }

    pub fn pointer_enter(&mut self, index: usize) {
        self.hovered = Some(index);
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_hovered(&self, index: usize) -> bool {
        self.hovered == Some(index)
    }

    /// The hovered record, ignoring indices that are out of range.
    pub fn record<'a>(&self, records: &'a [Record]) -> Option<&'a Record> {
        self.hovered.and_then(|i| records.get(i))
    }

    /// Moves the hover to whatever record sits under `(x, y)`
    ///
    /// # Returns
    /// * The record now hovered, or `None` when the pointer is over empty space
    pub fn pointer_move<'a>(&mut self, chart: &Chart<'a>, x: f64, y: f64) -> Option<&'a Record> {
        match chart.hit_test(x, y) {
            Some(index) => self.pointer_enter(index),
            None => self.pointer_leave(),
        }
        self.record(chart.records)
    }
}

/// Computes the top of the vertical scale
///
/// The scale always starts at 0 and ends one full billion above the smallest
/// whole-billion mark that is not below `max_value`.
///
/// # Examples
/// ```
/// use dashboard::graph::y_axis_max;
///
/// assert_eq!(y_axis_max(2_000_000_000.0), 3_000_000_000.0);
/// assert_eq!(y_axis_max(1_400_000_000.0), 3_000_000_000.0);
/// assert_eq!(y_axis_max(0.0), 1_000_000_000.0);
/// ```
pub fn y_axis_max(max_value: f64) -> f64 {
    ((max_value.max(0.0) / BILLION).ceil() * BILLION + BILLION).min(f64::MAX)
}

/// Distance between grid lines for a scale ending at `y_max`
pub fn y_tick_step(y_max: f64) -> f64 {
    let billions = (y_max / BILLION).round();
    (billions / MAX_GRID_INTERVALS as f64).ceil().max(1.0) * BILLION
}

/// Label for a whole-billion grid line: `"0"` at the origin, `"<n>B"` elsewhere
pub fn y_tick_label(value: f64) -> String {
    let billions = (value / BILLION).round();
    if billions == 0.0 {
        "0".to_string()
    } else if billions < 1e6 {
        format!("{}B", billions)
    } else {
        format!("{:e}B", billions)
    }
}

/// Distance between drawn x-axis labels for `count` records
pub fn x_label_step(count: usize) -> usize {
    if count > MAX_UNTHINNED_LABELS {
        count.div_ceil(THINNED_LABELS)
    } else {
        1
    }
}

/// Builds a smooth SVG path through `points`
///
/// Each segment `p1 -> p2` is a cubic Bezier whose control points come from
/// the neighbours: `cp1 = p1 + (p2 - p0) / 6` and `cp2 = p2 - (p3 - p1) / 6`.
/// Where a neighbour is missing at either end the adjacent point is reused, so
/// the curve does not overshoot its endpoints.
///
/// # Returns
/// * An SVG path `d` attribute, empty when there are no points
pub fn smooth_path(points: &[(f64, f64)]) -> String {
    let Some(&(x0, y0)) = points.first() else {
        return String::new();
    };
    let mut path = format!("M{:.2},{:.2}", x0, y0);
    for i in 0..points.len().saturating_sub(1) {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = *points.get(i + 2).unwrap_or(&p2);

        let cp1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
        let cp2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);
        let _ = write!(
            path,
            " C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
            cp1.0, cp1.1, cp2.0, cp2.1, p2.0, p2.1
        );
    }
    path
}

/// Geometry of one bar
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BarRect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// A chart over a borrowed record sequence
///
/// All geometry is derived on demand from the records, the chart type and
/// the fixed 600x350 canvas, so the same chart can be re-rendered for any
/// hover state without recomputation elsewhere.
#[derive(Clone, Debug)]
pub struct Chart<'a> {
    pub records: &'a [Record],
    pub chart_type: ChartType,
    pub padding: Padding,
    y_max: f64,
}

impl<'a> Chart<'a> {
    pub fn new(records: &'a [Record], chart_type: ChartType) -> Self {
        let max_value = records
            .iter()
            .flat_map(|r| SERIES.iter().map(move |s| r.value_or_zero(s.key)))
            .fold(0.0, f64::max);
        Self {
            records,
            chart_type,
            padding: Padding::default(),
            y_max: y_axis_max(max_value),
        }
    }

    pub fn plot_width(&self) -> f64 {
        CANVAS_WIDTH - self.padding.left - self.padding.right
    }

    pub fn plot_height(&self) -> f64 {
        CANVAS_HEIGHT - self.padding.top - self.padding.bottom
    }

    /// y coordinate of the horizontal axis
    pub fn baseline(&self) -> f64 {
        self.padding.top + self.plot_height()
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Horizontal position of record `index`
    ///
    /// Line charts interpolate across the plotting width with a single record
    /// centred; bar charts place each record in the middle of its slot.
    pub fn x_at(&self, index: usize) -> f64 {
        let n = self.records.len();
        match self.chart_type {
            ChartType::Line if n > 1 => {
                self.padding.left + index as f64 * self.plot_width() / (n - 1) as f64
            }
            ChartType::Line => self.padding.left + self.plot_width() / 2.0,
            ChartType::Bar => self.padding.left + self.slot_width() * (index as f64 + 0.5),
        }
    }

    /// Vertical position of `value` on the 0..y_max scale
    pub fn y_at(&self, value: f64) -> f64 {
        self.baseline() - (value / self.y_max) * self.plot_height()
    }

    /// Grid values from 0 up to the scale maximum
    ///
    /// One line per billion, unless that would exceed [`MAX_GRID_INTERVALS`];
    /// the step then widens to a whole multiple of a billion.
    pub fn y_ticks(&self) -> Vec<f64> {
        let step = y_tick_step(self.y_max);
        let count = ((self.y_max / step).floor() as usize).min(MAX_GRID_INTERVALS);
        (0..=count).map(|k| k as f64 * step).collect()
    }

    /// Indices of the records whose x-axis label is drawn
    pub fn x_label_indices(&self) -> Vec<usize> {
        let step = x_label_step(self.records.len());
        (0..self.records.len()).step_by(step).collect()
    }

    /// Canvas points of one series, missing values read as 0
    pub fn series_points(&self, key: &str) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (self.x_at(i), self.y_at(r.value_or_zero(key))))
            .collect()
    }

    fn slot_width(&self) -> f64 {
        self.plot_width() / self.records.len().max(1) as f64
    }

    /// Width of a single bar
    pub fn bar_width(&self) -> f64 {
        self.slot_width() * BAR_GROUP_RATIO * BAR_RATIO
    }

    /// Rectangle of the bar for record `index` in series number `series`
    ///
    /// The first series sits left of the record's centre, the second right of it.
    pub fn bar_rect(&self, index: usize, series: usize) -> BarRect {
        let width = self.bar_width();
        let centre = self.x_at(index);
        let value = self
            .records
            .get(index)
            .map_or(0.0, |r| r.value_or_zero(SERIES[series].key))
            .max(0.0);
        let top = self.y_at(value);
        BarRect {
            x: if series == 0 { centre - width } else { centre },
            y: top,
            width,
            height: self.baseline() - top,
        }
    }

    /// Finds the record under a pointer position given in canvas units
    ///
    /// Line charts use the enlarged hit circles, bar charts the bar rectangles.
    /// Elements drawn later win, as they do on screen.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        match self.chart_type {
            ChartType::Line => SERIES.iter().rev().find_map(|s| {
                self.series_points(s.key)
                    .iter()
                    .rposition(|&(px, py)| (px - x).hypot(py - y) <= HIT_RADIUS)
            }),
            ChartType::Bar => (0..self.records.len())
                .rev()
                .find(|&i| (0..SERIES.len()).any(|s| self.bar_rect(i, s).contains(x, y))),
        }
    }

    /// Renders the chart as an SVG document
    ///
    /// Every interactive element carries a `data-index` attribute naming its
    /// record so a client can report pointer enter/leave back as a
    /// [`HoverState`].
    ///
    /// # Arguments
    /// * `hover` - Record to highlight, if any
    ///
    /// # Returns
    /// * The complete `<svg>` element as a string
    pub fn render_svg(&self, hover: &HoverState) -> String {
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" class="chart chart--{kind}">"#,
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT,
            kind = self.chart_type,
        );
        self.write_grid(&mut svg);
        self.write_x_labels(&mut svg);
        match self.chart_type {
            ChartType::Line => self.write_lines(&mut svg, hover),
            ChartType::Bar => self.write_bars(&mut svg, hover),
        }
        svg.push_str("</svg>");
        svg
    }

    fn write_grid(&self, svg: &mut String) {
        svg.push_str(r#"<g class="grid">"#);
        let right = CANVAS_WIDTH - self.padding.right;
        for tick in self.y_ticks() {
            let y = self.y_at(tick);
            let _ = write!(
                svg,
                r##"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#e5e7eb" stroke-width="1"/><text x="{:.2}" y="{:.2}" text-anchor="end" font-size="10" fill="#6b7280">{}</text>"##,
                self.padding.left,
                right,
                self.padding.left - 6.0,
                y + 3.0,
                y_tick_label(tick),
            );
        }
        svg.push_str("</g>");
    }

    fn write_x_labels(&self, svg: &mut String) {
        svg.push_str(r#"<g class="x-labels">"#);
        let y = self.baseline() + 18.0;
        for i in self.x_label_indices() {
            let _ = write!(
                svg,
                r##"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="10" fill="#6b7280">{}</text>"##,
                self.x_at(i),
                y,
                escape_xml(&self.records[i].name),
            );
        }
        svg.push_str("</g>");
    }

    fn write_lines(&self, svg: &mut String, hover: &HoverState) {
        if self.records.is_empty() {
            return;
        }
        let baseline = self.baseline();
        for (n, series) in SERIES.iter().enumerate() {
            let points = self.series_points(series.key);
            let curve = smooth_path(&points);
            if n == 0 {
                let first = points[0];
                let last = points[points.len() - 1];
                let _ = write!(
                    svg,
                    r#"<path class="area" d="{} L{:.2},{:.2} L{:.2},{:.2} Z" fill="{}" fill-opacity="0.15" stroke="none"/>"#,
                    curve, last.0, baseline, first.0, baseline, series.color
                );
            }
            let _ = write!(
                svg,
                r#"<path class="line" data-series="{}" d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                series.key, curve, series.color
            );
        }

        for series in SERIES.iter() {
            for (i, (x, y)) in self.series_points(series.key).into_iter().enumerate() {
                let hovered = hover.is_hovered(i);
                let (radius, stroke_width) = if hovered {
                    (POINT_RADIUS_HOVERED, 3)
                } else {
                    (POINT_RADIUS, 2)
                };
                let _ = write!(
                    svg,
                    r#"<circle class="hit" data-series="{key}" data-index="{i}" cx="{x:.2}" cy="{y:.2}" r="{hit}" fill="transparent"/><circle class="point{state}" data-series="{key}" data-index="{i}" cx="{x:.2}" cy="{y:.2}" r="{radius}" fill="{fill}" stroke="{color}" stroke-width="{stroke_width}" pointer-events="none"/>"#,
                    key = series.key,
                    hit = HIT_RADIUS,
                    state = if hovered { " point--hovered" } else { "" },
                    fill = if hovered { series.color } else { "#ffffff" },
                    color = series.color,
                );
            }
        }
    }

    fn write_bars(&self, svg: &mut String, hover: &HoverState) {
        for i in 0..self.records.len() {
            let hovered = hover.is_hovered(i);
            for (s, series) in SERIES.iter().enumerate() {
                let mut rect = self.bar_rect(i, s);
                if hovered {
                    rect.x -= BAR_HOVER_GROWTH / 2.0;
                    rect.width += BAR_HOVER_GROWTH;
                }
                let _ = write!(
                    svg,
                    r#"<rect class="bar{}" data-series="{}" data-index="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" rx="2"/>"#,
                    if hovered { " bar--hovered" } else { "" },
                    series.key,
                    i,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    if hovered { series.hover_color } else { series.color },
                );
            }
        }
    }
}

/// Escapes text for use inside SVG/HTML markup
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(years: usize) -> Vec<Record> {
        (0..years)
            .map(|i| {
                Record::new(format!("{}", 1990 + i))
                    .with("india", 1e8 * (i + 1) as f64)
                    .with("world", 5e8 * (i + 1) as f64)
            })
            .collect()
    }

    #[test]
    fn scale_always_has_a_billion_of_headroom() {
        assert_eq!(y_axis_max(2e9), 3e9);
        assert_eq!(y_axis_max(2.1e9), 4e9);
        assert_eq!(y_axis_max(1.0), 2e9);
        assert_eq!(y_axis_max(-5.0), 1e9);

        let records = vec![Record::new("a").with("india", 2e9).with("world", 1e9)];
        let chart = Chart::new(&records, ChartType::Line);
        assert_eq!(chart.y_max(), 3e9);
        assert_eq!(chart.y_ticks(), vec![0.0, 1e9, 2e9, 3e9]);
    }

    #[test]
    fn grid_widens_its_step_for_large_values() {
        let records = vec![Record::new("a").with("india", 45e9)];
        let chart = Chart::new(&records, ChartType::Line);
        assert_eq!(chart.y_max(), 46e9);
        let ticks = chart.y_ticks();
        assert_eq!(ticks.len(), 16);
        assert_eq!(ticks[1], 3e9);
        assert_eq!(ticks[15], 45e9);

        for value in [1e20, 1e300, f64::MAX] {
            let records = vec![Record::new("huge").with("india", value).with("world", value)];
            for chart_type in [ChartType::Line, ChartType::Bar] {
                let chart = Chart::new(&records, chart_type);
                assert!(chart.y_max().is_finite());
                let ticks = chart.y_ticks();
                assert!(ticks.len() <= MAX_GRID_INTERVALS + 1);
                assert!(ticks.len() > 2);
                let svg = chart.render_svg(&HoverState::default());
                assert!(svg.ends_with("</svg>"));
            }
        }
    }

    #[test]
    fn tick_labels() {
        assert_eq!(y_tick_label(0.0), "0");
        assert_eq!(y_tick_label(1e9), "1B");
        assert_eq!(y_tick_label(7e9), "7B");
        assert_eq!(y_tick_label(1e20), "1e11B");
    }

    #[test]
    fn x_positions_interpolate_and_centre() {
        let records = population(3);
        let chart = Chart::new(&records, ChartType::Line);
        assert_eq!(chart.x_at(0), 40.0);
        assert_eq!(chart.x_at(1), 310.0);
        assert_eq!(chart.x_at(2), 580.0);

        let single = population(1);
        let chart = Chart::new(&single, ChartType::Line);
        assert_eq!(chart.x_at(0), 310.0);
    }

    #[test]
    fn y_positions_span_the_plot() {
        let records = vec![Record::new("a").with("world", 1.5e9)];
        let chart = Chart::new(&records, ChartType::Line);
        assert_eq!(chart.y_at(0.0), 320.0);
        assert_eq!(chart.y_at(chart.y_max()), 20.0);
    }

    #[test]
    fn labels_thin_out_above_ten_records() {
        assert_eq!(x_label_step(10), 1);
        assert_eq!(x_label_step(11), 2);
        assert_eq!(x_label_step(17), 3);
        assert_eq!(x_label_step(64), 8);

        let records = population(17);
        let chart = Chart::new(&records, ChartType::Line);
        assert_eq!(chart.x_label_indices(), vec![0, 3, 6, 9, 12, 15]);
    }

    #[test]
    fn smooth_path_uses_sixth_of_neighbour_span() {
        assert_eq!(smooth_path(&[]), "");
        assert_eq!(smooth_path(&[(1.0, 2.0)]), "M1.00,2.00");

        let path = smooth_path(&[(0.0, 0.0), (6.0, 6.0), (12.0, 0.0)]);
        assert_eq!(
            path,
            "M0.00,0.00 C1.00,1.00 4.00,6.00 6.00,6.00 C8.00,6.00 11.00,1.00 12.00,0.00"
        );
    }

    #[test]
    fn hover_is_exclusive() {
        let mut hover = HoverState::default();
        hover.pointer_enter(1);
        hover.pointer_enter(3);
        assert_eq!(hover.hovered(), Some(3));
        assert!(!hover.is_hovered(1));
        hover.pointer_leave();
        assert_eq!(hover.hovered(), None);
    }

    #[test]
    fn hover_changes_marker_attributes() {
        let records = population(3);
        let chart = Chart::new(&records, ChartType::Line);
        let idle = chart.render_svg(&HoverState::default());
        assert!(!idle.contains("point--hovered"));
        assert_eq!(idle.matches(r#"r="8""#).count(), 6);
        assert_eq!(idle.matches(r#"r="3""#).count(), 6);

        let hovered = chart.render_svg(&HoverState::new(Some(1)));
        assert_eq!(hovered.matches("point--hovered").count(), 2);
        assert_eq!(hovered.matches(r#"r="5""#).count(), 2);
        assert!(hovered.contains(r#"stroke-width="3""#));
    }

    #[test]
    fn line_hit_test_uses_enlarged_targets() {
        let records = population(3);
        let chart = Chart::new(&records, ChartType::Line);
        let (x, y) = chart.series_points("world")[2];
        assert_eq!(chart.hit_test(x + 7.0, y), Some(2));
        assert_eq!(chart.hit_test(x + 9.0, y + 9.0), None);

        let mut hover = HoverState::new(Some(0));
        let hit = hover.pointer_move(&chart, x, y).map(|r| r.name.clone());
        assert_eq!(hit.as_deref(), Some("1992"));
        assert_eq!(hover.pointer_move(&chart, 0.0, 0.0), None);
        assert_eq!(hover.hovered(), None);
    }

    #[test]
    fn bars_sit_either_side_of_centre() {
        let records = vec![
            Record::new("a").with("india", 1e9).with("world", 2e9),
            Record::new("b").with("world", 1e9),
        ];
        let chart = Chart::new(&records, ChartType::Bar);
        let centre = chart.x_at(0);
        assert_eq!(centre, 40.0 + 135.0);

        let left = chart.bar_rect(0, 0);
        let right = chart.bar_rect(0, 1);
        assert!((left.width - 270.0 * 0.8 * 0.4).abs() < 1e-9);
        assert!((left.x + left.width - centre).abs() < 1e-9);
        assert_eq!(right.x, centre);
        assert!(right.height > left.height);
        assert_eq!(chart.bar_rect(1, 0).height, 0.0);

        assert_eq!(chart.hit_test(centre + 1.0, chart.baseline() - 1.0), Some(0));
        assert_eq!(chart.hit_test(centre, 25.0), None);
    }

    #[test]
    fn hovered_bars_widen_and_recolour() {
        let records = population(2);
        let chart = Chart::new(&records, ChartType::Bar);
        let svg = chart.render_svg(&HoverState::new(Some(0)));
        assert_eq!(svg.matches("bar--hovered").count(), 2);
        assert!(svg.contains(SERIES[0].hover_color));
        assert!(svg.contains(SERIES[1].hover_color));
    }

    #[test]
    fn empty_chart_still_has_axes() {
        let chart = Chart::new(&[], ChartType::Line);
        let svg = chart.render_svg(&HoverState::new(Some(4)));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">0</text>"));
        assert!(svg.contains(">1B</text>"));
        assert!(!svg.contains("<circle"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn labels_are_escaped() {
        let records = vec![Record::new("<Q1 & Q2>")];
        let svg = Chart::new(&records, ChartType::Bar).render_svg(&HoverState::default());
        assert!(svg.contains("&lt;Q1 &amp; Q2&gt;"));
    }

    #[test]
    fn chart_type_parses() {
        assert_eq!("Bar".parse::<ChartType>(), Ok(ChartType::Bar));
        assert_eq!("line".parse::<ChartType>(), Ok(ChartType::Line));
        assert!("pie".parse::<ChartType>().is_err());
    }
}
