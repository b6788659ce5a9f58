//! Calibration chart rendering.
//!
//! Draws the confidence histogram and reliability diagram side by side into
//! an in-memory RGB buffer with plotters, then PNG-encodes it so callers can
//! log or display the image without touching the filesystem. Rendering only
//! reads the bin statistics; it never feeds back into the accumulators.

use std::io::Cursor;

use eval_core::{EvalError, EvalResult};
use plotters::coord::Shift;
use plotters::prelude::*;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 400;

// matplotlib's tab:green / tab:red
const BAR_GREEN: RGBColor = RGBColor(44, 160, 44);
const BAR_RED: RGBColor = RGBColor(214, 39, 40);

/// How the reliability diagram draws per-bin accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReliabilityMode {
    #[default]
    Bar,
    Line,
}

fn render_err<E: std::fmt::Display>(e: E) -> EvalError {
    EvalError::Render(e.to_string())
}

/// Render both calibration panels and return the encoded PNG bytes.
pub fn render_calibration(
    count_bin: &[f64],
    acc_bin: &[f64],
    mode: ReliabilityMode,
) -> EvalResult<Vec<u8>> {
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let (left, right) = root.split_horizontally((WIDTH / 2) as i32);
        draw_confidence_histogram(&left, count_bin)?;
        draw_reliability_diagram(&right, acc_bin, mode)?;
        root.present().map_err(render_err)?;
    }

    let img = image::RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| EvalError::Render("buffer size mismatch".to_string()))?;
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(render_err)?;
    Ok(out.into_inner())
}

/// Bar chart of the per-bin prediction-count fraction, percent axes.
fn draw_confidence_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    count_bin: &[f64],
) -> EvalResult<()> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..100.0f64, 0.0..100.0f64)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Confidence (%)")
        .y_desc("Frequency (%)")
        .draw()
        .map_err(render_err)?;

    let total: f64 = count_bin.iter().sum();
    let bars = bin_bars(count_bin, |count| {
        if total > 0.0 {
            count / total * 100.0
        } else {
            0.0
        }
    });
    chart
        .draw_series(bars.iter().map(|&(x0, x1, y)| {
            Rectangle::new([(x0, 0.0), (x1, y)], BAR_GREEN.mix(0.8).filled())
        }))
        .map_err(render_err)?;
    chart
        .draw_series(
            bars.iter()
                .map(|&(x0, x1, y)| Rectangle::new([(x0, 0.0), (x1, y)], BLACK)),
        )
        .map_err(render_err)?;
    Ok(())
}

/// Per-bin accuracy against the diagonal reference line.
fn draw_reliability_diagram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    acc_bin: &[f64],
    mode: ReliabilityMode,
) -> EvalResult<()> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..100.0f64, 0.0..100.0f64)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Confidence (%)")
        .y_desc("Accuracy (%)")
        .draw()
        .map_err(render_err)?;

    // Dotted diagonal: perfect calibration.
    let guide = (0..=10).map(|i| (i as f64 * 10.0, i as f64 * 10.0));
    chart
        .draw_series(DashedLineSeries::new(guide, 2, 3, BLACK.into()))
        .map_err(render_err)?;

    match mode {
        ReliabilityMode::Bar => {
            let bars = bin_bars(acc_bin, |acc| acc * 100.0);
            chart
                .draw_series(bars.iter().map(|&(x0, x1, y)| {
                    Rectangle::new([(x0, 0.0), (x1, y)], BAR_RED.mix(0.8).filled())
                }))
                .map_err(render_err)?;
            chart
                .draw_series(
                    bars.iter()
                        .map(|&(x0, x1, y)| Rectangle::new([(x0, 0.0), (x1, y)], BLACK)),
                )
                .map_err(render_err)?;
        }
        ReliabilityMode::Line => {
            let points: Vec<(f64, f64)> = bin_bars(acc_bin, |acc| acc * 100.0)
                .iter()
                .map(|&(x0, x1, y)| ((x0 + x1) / 2.0, y))
                .collect();
            chart
                .draw_series(LineSeries::new(points.clone(), BAR_RED.mix(0.8)))
                .map_err(render_err)?;
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, 4, BAR_RED.mix(0.8).filled())),
                )
                .map_err(render_err)?;
        }
    }
    Ok(())
}

/// Equal-width bar extents over the percent axis, with the bar height taken
/// from `value` applied to each bin.
fn bin_bars(bin_values: &[f64], value: impl Fn(f64) -> f64) -> Vec<(f64, f64, f64)> {
    let n = bin_values.len().max(1) as f64;
    bin_values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x0 = i as f64 * 100.0 / n;
            let x1 = (i + 1) as f64 * 100.0 / n;
            (x0, x1, value(v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_returns_png() {
        let counts = [5.0, 10.0, 0.0, 20.0, 40.0, 80.0, 120.0, 200.0, 300.0, 500.0];
        let accs = [0.05, 0.15, 0.0, 0.35, 0.45, 0.55, 0.65, 0.75, 0.85, 0.95];
        let png = render_calibration(&counts, &accs, ReliabilityMode::Bar).unwrap();
        assert!(png.len() > 8);
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_render_line_mode_and_empty_bins() {
        let counts = [0.0; 10];
        let accs = [0.0; 10];
        let png = render_calibration(&counts, &accs, ReliabilityMode::Line).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
