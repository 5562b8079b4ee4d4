// src/visualisation.rs

use std::path::Path;

use plotters::prelude::*;

use crate::calculator::FieldGrid;
use crate::error::OutputError;

/// Map a field value to blue (low) - white - red (high) within [lo, hi].
fn field_to_color(b: f64, lo: f64, hi: f64) -> RGBColor {
    let (lo, hi) = if !lo.is_finite() || !hi.is_finite() || (hi - lo).abs() < 1e-12 {
        (b - 1.0, b + 1.0)
    } else {
        (lo, hi)
    };

    let x = ((b - lo) / (hi - lo)).clamp(0.0, 1.0);

    let r = (255.0 * x) as u8;
    let bl = (255.0 * (1.0 - x)) as u8;
    let g = (255.0 * (1.0 - (2.0 * (x - 0.5).abs()))).clamp(0.0, 255.0) as u8;

    RGBColor(r, g, bl)
}

fn plot_err<E: std::fmt::Display>(e: E) -> OutputError {
    OutputError::Plot(e.to_string())
}

/// Save B(x,y) over one cell as a PNG heat map with axes in nm.
pub fn save_field_plot(grid: &FieldGrid, path: &Path, title: &str) -> Result<(), OutputError> {
    let n = grid.steps;
    let (dx, dy) = grid.cell.spacing(grid.grid());
    let width = grid.cell.width;
    let height = grid.cell.height;
    if !(width.is_finite() && height.is_finite()) || n == 0 {
        return Err(OutputError::Plot(
            "no finite cell to plot (zero field?)".to_string(),
        ));
    }

    let (lo, hi) = (grid.min(), grid.max());

    // keep the physical aspect ratio
    let px_w = 900u32;
    let px_h = ((px_w as f64) * height / width).clamp(300.0, 1200.0) as u32 + 60;

    let root = BitMapBackend::new(path, (px_w, px_h)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let caption = format!("{title}  (B: {lo:.1} G blue .. {hi:.1} G red)");
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption, ("sans-serif", 18))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..width, 0.0..height)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (nm)")
        .y_desc("y (nm)")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series((0..n).flat_map(|row| {
            (0..n).map(move |col| {
                let b = grid.data[row * n + col];
                let x0 = col as f64 * dx;
                let y0 = row as f64 * dy;
                Rectangle::new(
                    [(x0, y0), (x0 + dx, y0 + dy)],
                    field_to_color(b, lo, hi).filled(),
                )
            })
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_scale_endpoints() {
        assert_eq!(field_to_color(0.0, 0.0, 1.0), RGBColor(0, 0, 255));
        assert_eq!(field_to_color(1.0, 0.0, 1.0), RGBColor(255, 0, 0));
        let mid = field_to_color(0.5, 0.0, 1.0);
        assert_eq!(mid.1, 255);
        // flat field maps to the middle instead of dividing by zero
        assert_eq!(field_to_color(3.0, 3.0, 3.0).1, 255);
    }
}
