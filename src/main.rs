use anyhow::{Context, Result};
use clap::Parser;
use hyperseg::{PipelineParams, SegmentationPipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hyperseg")]
#[command(
    version,
    about = "Chunked superpixel segmentation for imaging-spectrometer cubes",
    long_about = None
)]
struct Cli {
    /// Input cube data file (BIL interleave; header expected at <spectra>.hdr)
    spectra: PathBuf,

    /// Invalid-pixel sentinel value
    #[arg(long, default_value_t = -9999.0)]
    flag: f64,

    /// Number of principal components for the spectral projection
    #[arg(long, default_value_t = 5)]
    npca: usize,

    /// Scene-wide superpixel target
    #[arg(long, default_value_t = 10000)]
    nseg: usize,

    /// Nominal chunk size in lines
    #[arg(long, default_value_t = 1000)]
    nchunk: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let params = PipelineParams {
        flag: cli.flag,
        npca: cli.npca,
        nseg: cli.nseg,
        nchunk: cli.nchunk,
    };

    let summary = SegmentationPipeline::new(params)
        .run(&cli.spectra)
        .with_context(|| format!("Segmentation of {} failed", cli.spectra.display()))?;

    log::info!(
        "Wrote {} ({} superpixels over {} lines x {} samples)",
        summary.label_path.display(),
        summary.segments,
        summary.lines,
        summary.samples
    );

    Ok(())
}
