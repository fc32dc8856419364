#![cfg(feature = "web")]
use crate::graph::{CANVAS_HEIGHT, CANVAS_WIDTH, Chart, ChartType, HoverState, SERIES};
use crate::record::Record;
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use log::info;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const GRID_COLOR: RGBColor = RGBColor(0xe5, 0xe7, 0xeb);
const AXIS_COLOR: RGBColor = RGBColor(0x9c, 0xa3, 0xaf);
/// Share of a record's slot covered by one bar (0.8 group x 0.4 bar)
const BAR_SLOT_SHARE: f64 = 0.32;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to draw chart: {0}")]
    Draw(String),
    #[error("failed to encode png: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write chart: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported chart file extension: {0}")]
    UnsupportedFormat(String),
}

fn draw_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Draw(e.to_string())
}

fn hex_color(hex: &str) -> RGBColor {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(0)
    };
    RGBColor(channel(1), channel(3), channel(5))
}

/// Renders a chart to PNG bytes
///
/// The bitmap mirrors the SVG rendering: same canvas, padding, y scale and
/// colours. Curves are drawn as straight segments and no text is drawn, so
/// no system fonts are needed.
///
/// # Arguments
/// * `chart` - Chart geometry over the records to draw
/// * `hover` - Record drawn in its hover colours, if any
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn render_png(chart: &Chart, hover: &HoverState) -> Result<Vec<u8>, ExportError> {
    let (width, height) = (CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32);
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let n = chart.records.len();
        let x_range = match chart.chart_type {
            ChartType::Line if n > 1 => 0.0..(n - 1) as f64,
            ChartType::Line => -1.0..1.0,
            ChartType::Bar => 0.0..n.max(1) as f64,
        };
        let x_span = (x_range.start, x_range.end);
        let padding = chart.padding;

        let mut plot = ChartBuilder::on(&root)
            .margin_top(padding.top as u32)
            .margin_right(padding.right as u32)
            .margin_bottom(padding.bottom as u32)
            .margin_left(padding.left as u32)
            .build_cartesian_2d(x_range, 0.0..chart.y_max())
            .map_err(draw_err)?;

        plot.draw_series(chart.y_ticks().into_iter().map(|tick| {
            PathElement::new(vec![(x_span.0, tick), (x_span.1, tick)], GRID_COLOR)
        }))
        .map_err(draw_err)?;
        plot.draw_series(std::iter::once(PathElement::new(
            vec![(x_span.0, 0.0), (x_span.1, 0.0)],
            AXIS_COLOR,
        )))
        .map_err(draw_err)?;

        match chart.chart_type {
            ChartType::Line => draw_lines(&mut plot, chart.records, hover)?,
            ChartType::Bar => draw_bars(&mut plot, chart.records, hover)?,
        }

        root.present().map_err(draw_err)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, width, height, ColorType::Rgb8)?;
    Ok(png)
}

type Plot<'a, 'b> = ChartContext<
    'a,
    BitMapBackend<'b>,
    Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>,
>;

fn draw_lines(plot: &mut Plot, records: &[Record], hover: &HoverState) -> Result<(), ExportError> {
    let single = records.len() == 1;
    let x = |i: usize| if single { 0.0 } else { i as f64 };

    for (s, series) in SERIES.iter().enumerate() {
        let color = hex_color(series.color);
        let points: Vec<(f64, f64)> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (x(i), r.value_or_zero(series.key)))
            .collect();

        if s == 0 {
            plot.draw_series(AreaSeries::new(points.iter().copied(), 0.0, color.mix(0.2)))
                .map_err(draw_err)?;
        }
        plot.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(draw_err)?;
        plot.draw_series(points.iter().enumerate().map(|(i, &p)| {
            if hover.is_hovered(i) {
                Circle::new(p, 5, hex_color(series.hover_color).filled())
            } else {
                Circle::new(p, 3, color.filled())
            }
        }))
        .map_err(draw_err)?;
    }
    Ok(())
}

fn draw_bars(plot: &mut Plot, records: &[Record], hover: &HoverState) -> Result<(), ExportError> {
    for (s, series) in SERIES.iter().enumerate() {
        let color = hex_color(series.color);
        let hover_color = hex_color(series.hover_color);
        plot.draw_series(records.iter().enumerate().map(|(i, r)| {
            let centre = i as f64 + 0.5;
            let (left, right) = if s == 0 {
                (centre - BAR_SLOT_SHARE, centre)
            } else {
                (centre, centre + BAR_SLOT_SHARE)
            };
            let value = r.value_or_zero(series.key).max(0.0);
            let fill = if hover.is_hovered(i) { hover_color } else { color };
            Rectangle::new([(left, 0.0), (right, value)], fill.filled())
        }))
        .map_err(draw_err)?;
    }
    Ok(())
}

/// Writes a chart to `path`, as SVG or PNG depending on the file extension
pub fn save_chart(path: &Path, records: &[Record], chart_type: ChartType) -> Result<(), ExportError> {
    let chart = Chart::new(records, chart_type);
    let hover = HoverState::default();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "svg" => fs::write(path, chart.render_svg(&hover))?,
        "png" => fs::write(path, render_png(&chart, &hover)?)?,
        other => return Err(ExportError::UnsupportedFormat(other.to_string())),
    }
    info!("wrote {} chart to {}", chart_type, path.display());
    Ok(())
}

/// Sample population records used by the demo charts
pub fn sample_records() -> Vec<Record> {
    [
        ("1960", 0.445e9, 3.03e9),
        ("1970", 0.555e9, 3.70e9),
        ("1980", 0.697e9, 4.44e9),
        ("1990", 0.870e9, 5.32e9),
        ("2000", 1.057e9, 6.15e9),
        ("2010", 1.234e9, 6.99e9),
        ("2020", 1.396e9, 7.84e9),
    ]
    .into_iter()
    .map(|(year, india, world)| Record::new(year).with("india", india).with("world", world))
    .collect()
}

/// Generates example charts
///
/// Writes a line and a bar chart, each as SVG and PNG, from
/// [`sample_records`] into `dir`.
///
/// # Returns
/// * A vector of (description, file path) pairs for every chart written
pub fn create_example_charts(dir: &Path) -> Result<Vec<(String, PathBuf)>, ExportError> {
    fs::create_dir_all(dir)?;
    let records = sample_records();
    let mut result = Vec::new();

    for chart_type in [ChartType::Line, ChartType::Bar] {
        for extension in ["svg", "png"] {
            let path = dir.join(format!("{}_chart.{}", chart_type, extension));
            save_chart(&path, &records, chart_type)?;
            result.push((format!("{} ({})", chart_type, extension), path));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn hex_colors_parse() {
        assert_eq!(hex_color("#3b82f6"), RGBColor(0x3b, 0x82, 0xf6));
        assert_eq!(hex_color("bad"), RGBColor(0, 0, 0));
    }

    #[test]
    fn png_output_for_both_chart_types() {
        let records = sample_records();
        for chart_type in [ChartType::Line, ChartType::Bar] {
            let chart = Chart::new(&records, chart_type);
            let png = render_png(&chart, &HoverState::new(Some(2))).unwrap();
            assert_eq!(png[..8], PNG_SIGNATURE);
        }
    }

    #[test]
    fn empty_and_single_record_charts_render() {
        let single = vec![Record::new("2020").with("india", 1.4e9)];
        for records in [Vec::new(), single] {
            for chart_type in [ChartType::Line, ChartType::Bar] {
                let chart = Chart::new(&records, chart_type);
                assert!(render_png(&chart, &HoverState::default()).is_ok());
            }
        }
    }

    #[test]
    fn example_charts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let written = create_example_charts(dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        for (_, path) in &written {
            assert!(path.exists());
        }
        let svg = fs::read_to_string(dir.path().join("bar_chart.svg")).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_chart(&dir.path().join("chart.gif"), &[], ChartType::Line).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ext) if ext == "gif"));
    }
}
