//! Waterfall rendering: the spectrum-analyzer palette and a PNG plotter.

use plotters::prelude::*;

use crate::stats::SummaryStats;
use crate::{PowerRow, BINS};

/// Piecewise-linear RGB stops of the spectrum-analyzer palette
/// (black, blue, yellow, red, magenta, washed-out magenta)
const PALETTE_STOPS: [(f64, (f64, f64, f64)); 6] = [
    (0.0, (0.0, 0.0, 0.0)),
    (0.2, (0.0, 0.0, 1.0)),
    (0.4, (1.0, 1.0, 0.0)),
    (0.6, (1.0, 0.0, 0.0)),
    (0.8, (1.0, 0.0, 1.0)),
    (1.0, (1.0, 0.764, 1.0)),
];

/// Map a normalized power value onto the palette
pub fn colormap(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    for pair in PALETTE_STOPS.windows(2) {
        let (x0, c0) = pair[0];
        let (x1, c1) = pair[1];
        if t <= x1 {
            let f = if x1 > x0 { (t - x0) / (x1 - x0) } else { 0.0 };
            return RGBColor(
                lerp_byte(c0.0, c1.0, f),
                lerp_byte(c0.1, c1.1, f),
                lerp_byte(c0.2, c1.2, f),
            );
        }
    }
    let (_, (r, g, b)) = PALETTE_STOPS[PALETTE_STOPS.len() - 1];
    RGBColor(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn lerp_byte(a: f64, b: f64, f: f64) -> u8 {
    ((a + (b - a) * f) * 255.0).round() as u8
}

/// Render a replayed waterfall to a PNG.
///
/// The first bin (DC) is dropped and the color range spans
/// `[trough + 30, peak + 30]`, matching the Kiwi waterfall display. `stats`
/// comes from the live-decoded matrix even though `matrix` is the replay view.
pub fn render_waterfall(
    path: &str,
    matrix: &[PowerRow],
    stats: &SummaryStats,
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = matrix.len();
    let bins = BINS as i32 - 1;
    let lo = stats.trough + 30.0;
    let hi = (stats.peak + 30.0).max(lo + 1.0);

    let root = BitMapBackend::new(path, (1400, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(0..bins, 0..rows as i32)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc("MHz")
        .x_label_formatter(&|x| format!("{:.0}", *x as f64 * 30.0 / BINS as f64))
        .draw()?;

    chart.draw_series(matrix.iter().enumerate().flat_map(|(y, row)| {
        row.iter().skip(1).enumerate().map(move |(x, &v)| {
            let t = ((v - lo) / (hi - lo)) as f64;
            Rectangle::new(
                [(x as i32, y as i32), (x as i32 + 1, y as i32 + 1)],
                colormap(t).filled(),
            )
        })
    }))?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_stops() {
        assert_eq!(colormap(0.0), RGBColor(0, 0, 0));
        assert_eq!(colormap(0.2), RGBColor(0, 0, 255));
        assert_eq!(colormap(0.4), RGBColor(255, 255, 0));
        assert_eq!(colormap(0.6), RGBColor(255, 0, 0));
        assert_eq!(colormap(0.8), RGBColor(255, 0, 255));
        assert_eq!(colormap(1.0), RGBColor(255, 195, 255));
    }

    #[test]
    fn test_palette_interpolates_between_stops() {
        assert_eq!(colormap(0.1), RGBColor(0, 0, 128));
        assert_eq!(colormap(0.5), RGBColor(255, 128, 0));
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        assert_eq!(colormap(-2.0), colormap(0.0));
        assert_eq!(colormap(7.0), colormap(1.0));
    }
}
