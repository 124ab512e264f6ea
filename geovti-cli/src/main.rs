use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geovti::{ConversionConfig, CsvConversionConfig};
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a GeoTIFF, or every GeoTIFF in a directory, to VTI
    Vti {
        /// Input GeoTIFF file or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output .vti file, or output directory when INPUT is a directory
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Name of the scalar field written to the VTI file
        #[arg(long, default_value = geovti::config::DEFAULT_VARIABLE_NAME)]
        variable: String,

        /// Sphere radius in km used to convert degrees to distances
        #[arg(long, default_value_t = geovti::grid::EARTH_RADIUS_KM)]
        earth_radius: f64,

        /// Number of parallel conversions in directory mode (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Convert a "Point, Latitude, Longitude" CSV to UTM eastings/northings
    Csv {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Print the header and value statistics of a VTI file
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let args = Args::parse();
    let start_time = std::time::Instant::now();

    match args.command {
        Command::Vti {
            input,
            output,
            variable,
            earth_radius,
            threads,
        } => {
            let config = ConversionConfig::new(&input, &output)
                .with_variable_name(variable)
                .with_earth_radius_km(earth_radius);

            if input.is_file() {
                convert_file(&config)?;
            } else if input.is_dir() {
                if let Some(threads) = threads {
                    ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build_global()
                        .context("Failed to build thread pool")?;
                }
                fs::create_dir_all(&output)?;
                info!("Processing directory: {:?}", input);
                process_directory(&input, &output, &config)?;
            } else {
                error!("Invalid input path: {:?}", input);
                anyhow::bail!("Input path must be a GeoTIFF file or directory");
            }
        }
        Command::Csv { input, output } => {
            let report = geovti::convert_csv(&CsvConversionConfig::new(&input, &output))
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            println!("File to read:       {}", report.input_path.display());
            println!("File to be created: {}", report.output_path.display());
            println!("Points written:     {}", report.points_written);
        }
        Command::Inspect { file } => inspect(&file)?,
    }

    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

/// `RUST_LOG` directives when set and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn convert_file(config: &ConversionConfig) -> Result<()> {
    let report = geovti::convert_geotiff(config)
        .with_context(|| format!("Failed to convert {}", config.input_path.display()))?;
    println!("{}", report);
    Ok(())
}

fn process_directory(dir: &Path, output_dir: &Path, config: &ConversionConfig) -> Result<()> {
    use rayon::prelude::*;

    let input_files = collect_geotiffs(dir)?;
    info!("Found {} GeoTIFF files", input_files.len());

    let configs = plan_outputs(&input_files, output_dir, config)?;

    let results: Vec<Result<()>> = configs.par_iter().map(convert_file).collect();

    let mut errors = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            errors.push(format!("{}: {:#}", input_files[i].display(), e));
        }
    }

    if !errors.is_empty() {
        error!("Failed to process {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to process", errors.len());
    }

    Ok(())
}

/// Maps every input to its output file, failing if two inputs would write the
/// same file.
fn plan_outputs(
    input_files: &[PathBuf],
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<ConversionConfig>> {
    let configs: Vec<ConversionConfig> = input_files
        .iter()
        .map(|path| config.for_input_in_dir(path, output_dir))
        .collect();

    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    let mut collisions = Vec::new();
    for c in &configs {
        if let Some(first) = claimed.insert(&c.output_path, &c.input_path) {
            collisions.push(format!(
                "{} and {} both map to {}",
                first.display(),
                c.input_path.display(),
                c.output_path.display()
            ));
        }
    }

    if !collisions.is_empty() {
        for collision in &collisions {
            error!("  {}", collision);
        }
        anyhow::bail!("{} output file name collisions", collisions.len());
    }

    Ok(configs)
}

fn collect_geotiffs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_geotiffs(&path)?);
        } else if is_geotiff(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_geotiff(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref(),
        Some("tif") | Some("tiff")
    )
}

fn inspect(path: &Path) -> Result<()> {
    let doc = geovti::VtiReader::new()
        .read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let g = &doc.grid;

    println!("File:      {}", path.display());
    println!("Variable:  {}", doc.variable_name);
    println!("Extent:    {}", g.extent());
    println!("Origin:    {:.6} {:.6} {:.6}", g.ox, g.oy, g.oz);
    println!("Spacing:   {:.6} {:.6} {:.6}", g.dx, g.dy, g.dz);
    println!("Points:    {}", doc.values.len());
    println!("Byte count: {}", doc.byte_count()?);
    match doc.value_range() {
        Some((min, max)) => println!("Range:     {} .. {}", min, max),
        None => println!("Range:     no valid data"),
    }

    Ok(())
}
