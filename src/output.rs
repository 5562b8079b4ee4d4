// src/output.rs
//
// Plain-text outputs: the field map as CSV, a JSON summary per run, and a CSV table for
// model comparisons.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::calculator::{ConvergenceReport, FieldCalculator, FieldGrid};
use crate::error::OutputError;
use crate::grid::UnitCell;
use crate::params::VortexParams;

/// Scalar description of one evaluated grid.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub model: String,
    pub params: VortexParams,
    pub steps: usize,
    pub cell: UnitCell,
    pub b_mean: f64,
    pub b_min: f64,
    pub b_max: f64,
    pub convergence: Option<ConvergenceReport>,
}

impl FieldSummary {
    /// Evaluate (if needed) and summarise the calculator's current grid.
    pub fn from_calculator(calc: &mut dyn FieldCalculator) -> Self {
        let b_min = calc.b_min();
        let b_max = calc.b_max();
        let model = calc.model_name().to_string();
        let params = calc.parameters();
        let grid = calc.calculate_grid();
        Self {
            model,
            params,
            steps: grid.steps,
            cell: grid.cell,
            b_mean: grid.mean(),
            b_min,
            b_max,
            convergence: grid.convergence,
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// One line per grid point: `x_nm,y_nm,b_gauss`, rows of constant y in order.
pub fn write_field_csv(grid: &FieldGrid, path: &Path) -> Result<(), OutputError> {
    let mut w = create(path)?;
    write_field_csv_to(grid, &mut w)?;
    w.flush()?;
    Ok(())
}

pub fn write_field_csv_to<W: Write>(grid: &FieldGrid, w: &mut W) -> Result<(), OutputError> {
    let n = grid.steps;
    let (dx, dy) = grid.cell.spacing(grid.grid());

    writeln!(w, "# vortex-field {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        w,
        "# symmetry={}, lattice_constant_nm={:.6e}, steps={}",
        grid.cell.symmetry.as_str(),
        grid.cell.lattice_constant,
        n
    )?;
    writeln!(w, "x_nm,y_nm,b_gauss")?;
    for row in 0..n {
        for col in 0..n {
            writeln!(
                w,
                "{:.6e},{:.6e},{:.9e}",
                col as f64 * dx,
                row as f64 * dy,
                grid.data[row * n + col]
            )?;
        }
    }
    Ok(())
}

pub fn write_summary_json(summary: &FieldSummary, path: &Path) -> Result<(), OutputError> {
    let mut w = create(path)?;
    serde_json::to_writer_pretty(&mut w, summary)?;
    w.flush()?;
    Ok(())
}

/// Summaries of several models over a field sweep, one line each.
pub fn write_comparison_csv(rows: &[FieldSummary], path: &Path) -> Result<(), OutputError> {
    let mut w = create(path)?;
    writeln!(
        w,
        "model,field_g,lambda_nm,xi_nm,steps,b_mean,b_min,b_max,iterations,converged"
    )?;
    for s in rows {
        let (iterations, converged) = match s.convergence {
            Some(r) => (r.iterations.to_string(), r.converged.to_string()),
            None => (String::new(), String::new()),
        };
        writeln!(
            w,
            "{},{},{},{},{},{:.9e},{:.9e},{:.9e},{},{}",
            s.model,
            s.params.field,
            s.params.lambda,
            s.params.xi,
            s.steps,
            s.b_mean,
            s.b_min,
            s.b_max,
            iterations,
            converged
        )?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::LatticeSymmetry;

    #[test]
    fn csv_layout() {
        let cell = UnitCell::new(LatticeSymmetry::Square, 4.0);
        let mut grid = FieldGrid::uniform(cell, 2, 1.0);
        grid.data[3] = 7.0;

        let mut buf = Vec::new();
        write_field_csv_to(&grid, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("# vortex-field"));
        assert!(lines[1].contains("symmetry=square"));
        assert_eq!(lines[2], "x_nm,y_nm,b_gauss");
        assert_eq!(lines.len(), 3 + 4);

        // last point: col 1, row 1 at (2 nm, 2 nm)
        let last: Vec<f64> = lines[6].split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(last, vec![2.0, 2.0, 7.0]);
    }
}
