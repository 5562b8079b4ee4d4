// src/main.rs
//
// Command-line driver.
//
// Examples:
//
//   cargo run --release -- run --field 100 --lambda 150 --xi 5 --model ngl --steps 128 --plot
//       -> one grid, written to out/field.csv, out/summary.json, out/config.json, out/field.png
//
//   cargo run --release -- run --config job.json
//       -> same, with everything taken from a JSON RunConfig
//
//   cargo run --release -- compare --fields 100,500,2000 --lambda 150 --xi 5 --steps 64
//       -> London vs NGL statistics per field, written to out/compare.csv
//
// Set RUST_LOG=debug to see planner and solver diagnostics.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use vortex_field::config::RunConfig;
use vortex_field::output::{write_comparison_csv, write_field_csv, write_summary_json, FieldSummary};
use vortex_field::visualisation::save_field_plot;
use vortex_field::{build_calculator, GradientScheme, ModelKind, NglSettings, VortexParams};

#[derive(Parser)]
#[command(name = "vortex-field")]
#[command(about = "Field distribution of superconducting vortex lattices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one field map.
    Run {
        /// JSON configuration; flags below override it.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
        /// Mean field in Gauss.
        #[arg(long)]
        field: Option<f64>,
        /// Penetration depth in nm.
        #[arg(long)]
        lambda: Option<f64>,
        /// Coherence length in nm.
        #[arg(long)]
        xi: Option<f64>,
        /// Grid resolution N.
        #[arg(long)]
        steps: Option<usize>,
        /// FFT wisdom file.
        #[arg(long)]
        wisdom: Option<PathBuf>,
        #[arg(long, value_enum)]
        gradient: Option<GradientArg>,
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Also write field.png.
        #[arg(long)]
        plot: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// London vs NGL over a list of fields.
    Compare {
        /// Comma-separated fields in Gauss.
        #[arg(long, value_delimiter = ',', default_values_t = vec![100.0, 500.0, 2000.0])]
        fields: Vec<f64>,
        #[arg(long, default_value_t = 150.0)]
        lambda: f64,
        #[arg(long, default_value_t = 5.0)]
        xi: f64,
        #[arg(long, default_value_t = 64)]
        steps: usize,
        #[arg(long)]
        wisdom: Option<PathBuf>,
        #[arg(short, long, default_value = "out")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    London,
    SquareLondon,
    ModifiedLondon,
    AnalyticalGl,
    Ngl,
}

impl From<ModelArg> for ModelKind {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::London => ModelKind::London,
            ModelArg::SquareLondon => ModelKind::SquareLondon,
            ModelArg::ModifiedLondon => ModelKind::ModifiedLondon,
            ModelArg::AnalyticalGl => ModelKind::AnalyticalGl,
            ModelArg::Ngl => ModelKind::Ngl,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GradientArg {
    Central,
    Spectral,
}

impl From<GradientArg> for GradientScheme {
    fn from(value: GradientArg) -> Self {
        match value {
            GradientArg::Central => GradientScheme::CentralDifference,
            GradientArg::Spectral => GradientScheme::Spectral,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            model,
            field,
            lambda,
            xi,
            steps,
            wisdom,
            gradient,
            max_iterations,
            plot,
            output,
        } => {
            let mut cfg = match &config {
                Some(path) => {
                    info!("[cli] loading config {}", path.display());
                    RunConfig::load(path)?
                }
                None => RunConfig::default(),
            };

            if let Some(m) = model {
                cfg.model = m.into();
            }
            let p = cfg.params;
            cfg.params = VortexParams::new(
                field.unwrap_or(p.field),
                lambda.unwrap_or(p.lambda),
                xi.unwrap_or(p.xi),
            );
            if let Some(s) = steps {
                cfg.steps = s;
            }
            if wisdom.is_some() {
                cfg.wisdom = wisdom;
            }
            if let Some(g) = gradient {
                cfg.ngl.gradient = g.into();
            }
            if let Some(it) = max_iterations {
                cfg.ngl.max_iterations = it;
            }
            if plot {
                cfg.output.plot = true;
            }
            if let Some(dir) = output {
                cfg.output.directory = dir;
            }
            cfg.validate()?;

            run_single(&cfg)
        }
        Commands::Compare {
            fields,
            lambda,
            xi,
            steps,
            wisdom,
            output,
        } => {
            let mut rows = Vec::new();
            for kind in [ModelKind::London, ModelKind::Ngl] {
                let mut calc =
                    build_calculator(kind, steps, NglSettings::default(), wisdom.as_deref());
                for &b in &fields {
                    calc.set_parameters(VortexParams::new(b, lambda, xi));
                    let s = FieldSummary::from_calculator(calc.as_mut());
                    println!(
                        "{:>6} B={:>9.2} G  mean={:>10.4}  min={:>10.4}  max={:>10.4}",
                        s.model, b, s.b_mean, s.b_min, s.b_max
                    );
                    rows.push(s);
                }
            }
            let path = output.join("compare.csv");
            write_comparison_csv(&rows, &path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_single(cfg: &RunConfig) -> Result<(), Box<dyn Error>> {
    let out_dir = &cfg.output.directory;
    std::fs::create_dir_all(out_dir)?;
    cfg.write_to_dir(out_dir)?;

    let mut calc = build_calculator(cfg.model, cfg.steps, cfg.ngl, cfg.wisdom.as_deref());
    calc.set_parameters(cfg.params);

    let t0 = std::time::Instant::now();
    let summary = FieldSummary::from_calculator(calc.as_mut());
    info!(
        "[cli] {} N={} evaluated in {:.3}s",
        summary.model,
        summary.steps,
        t0.elapsed().as_secs_f64()
    );

    println!("model        : {}", summary.model);
    println!(
        "parameters   : B={} G, lambda={} nm, xi={} nm",
        summary.params.field, summary.params.lambda, summary.params.xi
    );
    println!(
        "cell         : {} a={:.3} nm ({:.3} x {:.3} nm), N={}",
        summary.cell.symmetry.as_str(),
        summary.cell.lattice_constant,
        summary.cell.width,
        summary.cell.height,
        summary.steps
    );
    println!(
        "B mean/min/max: {:.4} / {:.4} / {:.4} G",
        summary.b_mean, summary.b_min, summary.b_max
    );
    if let Some(r) = summary.convergence {
        println!(
            "convergence  : {} after {} iteration(s)",
            if r.converged { "converged" } else { "NOT converged" },
            r.iterations
        );
    }

    write_summary_json(&summary, &out_dir.join("summary.json"))?;

    let grid = calc.calculate_grid();
    if cfg.output.csv {
        write_field_csv(grid, &out_dir.join("field.csv"))?;
    }
    if cfg.output.plot {
        let title = format!("{} B={} G", summary.model, summary.params.field);
        save_field_plot(grid, &out_dir.join("field.png"), &title)?;
    }

    println!("Outputs written to {}", out_dir.display());
    Ok(())
}
