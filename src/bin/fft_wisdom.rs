// src/bin/fft_wisdom.rs
//
// Create or refresh an FFT wisdom file for the given grid sizes, so later runs that point
// at it plan without benchmarking.
//
// Run:
//   cargo run --release --bin fft_wisdom -- --path fftw.json 64 128 256 512
//
// Use --force to re-measure lengths that are already recorded.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use vortex_field::fft::choose_kernel;
use vortex_field::wisdom::Wisdom;

#[derive(Parser, Debug)]
#[command(name = "fft_wisdom", about = "Benchmark FFT kernels and store the winners")]
struct Cli {
    /// Wisdom file to create or update.
    #[arg(long, default_value = "fftw_wisdom.json")]
    path: PathBuf,
    /// Re-measure every requested size.
    #[arg(long)]
    force: bool,
    /// Grid resolutions N.
    #[arg(required = true)]
    sizes: Vec<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut wisdom = Wisdom::load_or_create(&cli.path);

    for &n in &cli.sizes {
        if n == 0 {
            return Err("grid size must be positive".into());
        }
        if cli.force {
            wisdom.forget(n);
        }
        let kernel = choose_kernel(n, &mut wisdom);
        match wisdom.get(n) {
            Some(rec) => println!(
                "N={n:>6}: {kernel:?} ({:.1} ns per 1D transform)",
                rec.nanos_per_transform
            ),
            None => println!("N={n:>6}: {kernel:?}"),
        }
    }

    wisdom.export()?;
    println!("Wrote {} entr(y/ies) to {}", wisdom.len(), wisdom.path().display());
    wisdom.disarm();
    Ok(())
}
