//! isomesh - Command-line isosurface extraction
//!
//! Provides subcommands for:
//! - `extract`: Extract a mesh from a volume and write it as OBJ
//! - `info`: Inspect a `.dat` volume
//! - `generate`: Write the radial test volume as `.dat`
//! - `sweep`: Extract over a range of isovalues and report counts

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use iso_engine::{ColorMode, ExtractionStats, MarchingCubes, ScalarField};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;

use config::ToolConfig;

/// Resolution of the built-in volume when no input is given
const DEFAULT_RADIAL_SIZE: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "isomesh")]
#[command(about = "Extract isosurface meshes from scalar volumes", long_about = None)]
struct Cli {
    /// Configuration file (created with defaults if missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract an isosurface and export it as OBJ
    Extract(ExtractArgs),
    /// Print extents and value range of a .dat volume
    Info(InfoArgs),
    /// Write the radial test volume as a .dat file
    Generate(GenerateArgs),
    /// Extract over a range of isovalues and report mesh sizes
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Input .dat volume
    #[arg(short, long, conflicts_with = "radial")]
    input: Option<PathBuf>,

    /// Use the built-in radial volume with N samples per axis (default when no input is given)
    #[arg(long, value_name = "N")]
    radial: Option<usize>,

    /// Number of halvings before extraction (overrides config)
    #[arg(long, value_name = "K")]
    subsample: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorArg {
    Constant,
    Grayscale,
    Heat,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Isovalue (overrides config)
    #[arg(long)]
    iso: Option<f32>,

    /// Use the parallel extraction path
    #[arg(long)]
    parallel: bool,

    /// Vertex coloring (overrides config)
    #[arg(long, value_enum)]
    color: Option<ColorArg>,

    /// Output OBJ file path
    #[arg(short, long, default_value = "latest.obj")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Input .dat volume
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Samples per axis
    #[arg(long, default_value_t = DEFAULT_RADIAL_SIZE)]
    size: usize,

    /// Output .dat file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// First isovalue
    #[arg(long, default_value_t = 0.0)]
    from: f32,

    /// Last isovalue
    #[arg(long, default_value_t = 1.0)]
    to: f32,

    /// Isovalue increment
    #[arg(long, default_value_t = 0.05)]
    step: f32,

    /// Use the parallel extraction path
    #[arg(long)]
    parallel: bool,
}

fn init_logging(config: &ToolConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.output.log_level.filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Import or generate the volume, then apply the configured subsampling
fn load_field(source: &SourceArgs, config: &ToolConfig) -> Result<ScalarField> {
    let mut field = match &source.input {
        Some(path) => ScalarField::import_dat(path)
            .with_context(|| format!("Failed to import volume {}", path.display()))?,
        None => {
            let n = source.radial.unwrap_or(DEFAULT_RADIAL_SIZE);
            tracing::info!("Generating radial volume {n}x{n}x{n}");
            ScalarField::radial(n)
        }
    };

    let passes = source.subsample.unwrap_or(config.preprocess.subsample_passes);
    for _ in 0..passes {
        field.subsample();
    }
    if passes > 0 {
        let [nx, ny, nz] = field.dims();
        tracing::info!("Subsampled {passes} times to {nx}x{ny}x{nz}");
    }
    Ok(field)
}

fn print_stats_summary(stats: &ExtractionStats) {
    println!();
    println!("=== Extraction Statistics ===");
    println!("Isovalue:        {:.3}", stats.isovalue);
    println!("Total time:      {:.2}ms", stats.total_ms());
    println!("  Classify:      {:.2}ms", stats.classify_ms);
    println!("  Triangulate:   {:.2}ms", stats.triangulate_ms);
    println!(
        "Cells:           {} ({} crossed, {} empty)",
        stats.cells, stats.triangulated_cells, stats.empty_cells
    );
    println!("Vertices:        {}", stats.vertices);
    println!("Triangles:       {}", stats.triangles);
    println!("=============================");
}

fn run_extract(args: ExtractArgs, mut config: ToolConfig) -> Result<()> {
    if let Some(iso) = args.iso {
        config.extraction.isovalue = iso;
    }
    if args.parallel {
        config.extraction.parallel = true;
    }
    match args.color {
        Some(ColorArg::Constant) => {
            if !matches!(config.extraction.color, ColorMode::Constant(_)) {
                config.extraction.color = ColorMode::default();
            }
        }
        Some(ColorArg::Grayscale) => config.extraction.color = ColorMode::Grayscale,
        Some(ColorArg::Heat) => config.extraction.color = ColorMode::Heat,
        None => {}
    }

    let field = load_field(&args.source, &config)?;
    let extractor = MarchingCubes::with_config(&field, config.extraction.extract_config()?);
    let (mesh, stats) = extractor.compute_with_stats(config.extraction.isovalue);
    print_stats_summary(&stats);

    mesh.export_obj(&args.output)
        .with_context(|| format!("Failed to write mesh {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let field = ScalarField::import_dat(&args.input)
        .with_context(|| format!("Failed to import volume {}", args.input.display()))?;
    let [nx, ny, nz] = field.dims();

    println!("File:      {}", args.input.display());
    println!("Extents:   {nx} x {ny} x {nz}");
    println!("Samples:   {}", field.size());
    println!("Cells:     {}", field.cell_count());
    match field.value_range() {
        Some((lo, hi)) => println!("Range:     {lo:.4} .. {hi:.4}"),
        None => println!("Range:     (empty)"),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    ensure!(args.size <= u16::MAX as usize, "size {} exceeds {}", args.size, u16::MAX);
    let field = ScalarField::radial(args.size);
    field
        .export_dat(&args.output)
        .with_context(|| format!("Failed to write volume {}", args.output.display()))?;
    println!(
        "Wrote {n}x{n}x{n} radial volume to {}",
        args.output.display(),
        n = args.size
    );
    Ok(())
}

/// Isovalues from `from` to `to` in increments of `step`, clamped to [0, 1]
fn sweep_isovalues(from: f32, to: f32, step: f32) -> Result<Vec<f32>> {
    ensure!(step > 0.0, "step must be positive, got {step}");
    ensure!(from <= to, "empty range {from} .. {to}");

    let count = ((to - from) / step + 1e-4).floor() as usize + 1;
    let mut isovalues: Vec<f32> = (0..count)
        .map(|n| (from + n as f32 * step).clamp(0.0, 1.0))
        .collect();
    isovalues.dedup();
    Ok(isovalues)
}

fn run_sweep(args: SweepArgs, config: ToolConfig) -> Result<()> {
    let isovalues = sweep_isovalues(args.from, args.to, args.step)?;
    let field = load_field(&args.source, &config)?;

    let mut extract_config = config.extraction.extract_config()?;
    extract_config.parallel |= args.parallel;
    let extractor = MarchingCubes::with_config(&field, extract_config);

    println!("{:>8} {:>10} {:>10} {:>10}", "iso", "vertices", "triangles", "ms");
    for iso in isovalues {
        let (_, stats) = extractor.compute_with_stats(iso);
        println!(
            "{:>8.3} {:>10} {:>10} {:>10.2}",
            iso,
            stats.vertices,
            stats.triangles,
            stats.total_ms()
        );
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ToolConfig> {
    let default_path = ToolConfig::default_path();
    let path = path.unwrap_or(default_path.as_path());
    ToolConfig::load(path).with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Extract(args) => run_extract(args, config),
        Commands::Info(args) => run_info(args),
        Commands::Generate(args) => run_generate(args),
        Commands::Sweep(args) => run_sweep(args, config),
    }
}
