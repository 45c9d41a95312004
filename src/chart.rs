use crate::format::format_euro;
use crate::section::Slice;
use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Configuration options for chart generation
///
/// Title and axis labels are filled in per chart by the section; only the
/// size is configurable.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Verdeling per Object".to_string(),
            x_label: "Object".to_string(),
            y_label: "Waarde".to_string(),
            width: 480,
            height: 400,
        }
    }
}

impl ChartOptions {
    pub fn titled(&self, title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..self.clone()
        }
    }
}

/// Draws a bar per object with its value as height
///
/// # Returns
/// * The SVG document as a string
///
/// # Errors
/// * Returns an error if there are no slices or the drawing backend fails
pub fn bar_chart_svg(slices: &[Slice], options: &ChartOptions) -> Result<String, Box<dyn Error>> {
    if slices.is_empty() {
        return Err("no data to draw".into());
    }

    let labels: Vec<&str> = slices.iter().map(|s| s.object.as_str()).collect();
    let max_y = slices.iter().map(|s| s.waarde).fold(0.0_f64, f64::max);
    let y_top = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d((0..slices.len()).into_segmented(), 0.0..y_top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(slices.len())
            .x_label_formatter(&|v: &SegmentValue<usize>| match v {
                SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|v: &f64| format_euro(*v))
            .draw()?;

        chart.draw_series(slices.iter().enumerate().map(|(i, slice)| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), slice.waarde.max(0.0)),
                ],
                BLUE.mix(0.7).filled(),
            );
            bar.set_margin(0, 0, 3, 3);
            bar
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Draws the share of each object as a pie with a legend on the right
///
/// Slices with a zero or negative share are listed in the legend but not drawn.
pub fn pie_chart_svg(slices: &[Slice], options: &ChartOptions) -> Result<String, Box<dyn Error>> {
    if slices.is_empty() {
        return Err("no data to draw".into());
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(&options.title, ("sans-serif", 20).into_font())?;

        let (width, height) = area.dim_in_pixel();
        let (width, height) = (width as i32, height as i32);
        let legend_x = width * 3 / 5;
        let radius = ((legend_x.min(height) / 2) - 10).max(10) as f64;
        let center = (legend_x / 2, height / 2);
        let legend = legend_layout(slices.len(), (legend_x, width), height);

        let mut angle = -FRAC_PI_2;
        for (i, slice) in slices.iter().enumerate() {
            let color = Palette99::pick(i);

            if slice.share > 0.0 {
                let sweep = slice.share * TAU;
                let steps = (slice.share * 120.0).ceil().max(2.0) as usize;
                let mut points = Vec::with_capacity(steps + 2);
                points.push(center);
                for step in 0..=steps {
                    let a = angle + sweep * step as f64 / steps as f64;
                    points.push((
                        center.0 + (radius * a.cos()).round() as i32,
                        center.1 + (radius * a.sin()).round() as i32,
                    ));
                }
                area.draw(&Polygon::new(points, color.filled()))?;
                angle += sweep;
            }

            let (x, y) = legend.positions[i];
            let swatch = legend.row_height * 5 / 8;
            area.draw(&Rectangle::new([(x, y), (x + swatch, y + swatch)], color.filled()))?;
            area.draw(&Text::new(
                format!("{} ({:.1}%)", slice.object, slice.share * 100.0),
                (x + swatch + 6, y),
                ("sans-serif", legend.font_size).into_font(),
            ))?;
        }

        root.present()?;
    }

    Ok(svg)
}

const LEGEND_MARGIN: i32 = 10;
const MAX_LEGEND_ROW: i32 = 16;
const MIN_LEGEND_ROW: i32 = 9;

/// Where the pie legend entries go
#[derive(Clone, Debug, PartialEq)]
struct LegendLayout {
    row_height: i32,
    font_size: i32,
    /// Top-left corner of each entry, in slice order
    positions: Vec<(i32, i32)>,
}

/// Stack entries between `columns.0` and `columns.1`, shrinking rows to fit
/// `height` and wrapping into more columns once rows hit their minimum
fn legend_layout(count: usize, columns: (i32, i32), height: i32) -> LegendLayout {
    let (left, right) = columns;
    let usable = (height - 2 * LEGEND_MARGIN).max(MIN_LEGEND_ROW);
    let slots = count.max(1) as i32;

    let row_height = (usable / slots).clamp(MIN_LEGEND_ROW, MAX_LEGEND_ROW);
    let per_column = (usable / row_height).max(1);
    let column_count = (slots + per_column - 1) / per_column;
    let column_width = ((right - left) / column_count).max(1);

    let positions = (0..count as i32)
        .map(|i| {
            (
                left + (i / per_column) * column_width,
                LEGEND_MARGIN + (i % per_column) * row_height,
            )
        })
        .collect();

    LegendLayout {
        row_height,
        font_size: (row_height - 4).clamp(7, 11),
        positions,
    }
}
