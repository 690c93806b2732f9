use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colorcard::batch::{self, ImageReport};
use colorcard::calib::fit_named;
use colorcard::PipelineConfig;
use log::{info, warn};
use ndarray::{Array1, Array2};
use serde::Serialize;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "colorcard")]
#[command(version, about = "Paired color-card extraction and gray-ramp calibration", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract per-cell means and features from one image or a directory
    Extract {
        /// Input image file or directory (searched recursively)
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Output directory for JSON reports
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Pipeline configuration (JSON); defaults when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Also write `<stem>_annotated.png` with boxes and sampled cells
        #[arg(long)]
        annotate: bool,

        /// Override the configured base seed
        #[arg(long, value_name = "N")]
        seed: Option<u64>,

        /// Override the feature mode: log_ratio, ratio or multi
        #[arg(long, value_name = "MODE")]
        mode: Option<String>,

        /// Number of worker threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Fit per-channel gray response curves and correct RGB values
    Calibrate {
        /// JSON array of S target gray levels
        #[arg(long, value_name = "FILE")]
        targets: PathBuf,

        /// JSON array of S measured [r, g, b] means
        #[arg(long, value_name = "FILE")]
        measured: PathBuf,

        /// Curve model: linear or poly2
        #[arg(long, value_name = "MODE", default_value = "linear")]
        mode: String,

        /// JSON array of [r, g, b] values to correct
        #[arg(long, value_name = "FILE")]
        values: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write the default pipeline configuration
    InitConfig {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        colorcard::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = colorcard::core::init_with_level(colorcard::core::level_from_verbosity(verbose));
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            input,
            output,
            config,
            annotate,
            seed,
            mode,
            threads,
        } => cmd_extract(
            &input,
            &output,
            config.as_deref(),
            annotate,
            seed,
            mode.as_deref(),
            threads,
        ),
        Commands::Calibrate {
            targets,
            measured,
            mode,
            values,
            output,
        } => cmd_calibrate(&targets, &measured, &mode, &values, output.as_deref()),
        Commands::InitConfig { path } => {
            PipelineConfig::default().write_json(&path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    annotate: bool,
    seed: Option<u64>,
    mode: Option<&str>,
    threads: Option<usize>,
) -> CliResult<()> {
    let mut cfg = match config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    if let Some(mode) = mode {
        cfg.features.set_mode(mode)?;
    }
    cfg.validate()?;

    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()?;
    }

    let (root, paths) = if input.is_dir() {
        (input.to_path_buf(), batch::find_images(input)?)
    } else {
        let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
        (root, vec![input.to_path_buf()])
    };
    if paths.is_empty() {
        return Err(format!("no images found under {}", input.display()).into());
    }
    info!("processing {} images", paths.len());

    let items = batch::process_batch(&paths, &cfg)?;
    let mut ok = 0usize;
    for item in &items {
        let report = ImageReport::from_item(item, cfg.save_extras);
        report.write_json(batch::report_path(&root, output, &item.path, "", "json"))?;

        let Ok(result) = &item.outcome else {
            continue;
        };
        ok += 1;
        if annotate {
            let mut canvas = batch::load_rgb(&item.path)?;
            result.annotate(&mut canvas);
            let path = batch::report_path(&root, output, &item.path, "_annotated", "png");
            if let Err(e) = canvas.save(&path) {
                warn!("{}: could not save annotation: {e}", path.display());
            }
        }
    }

    println!(
        "{ok}/{} images extracted, reports in {}",
        items.len(),
        output.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct CalibrationOutput {
    curve: colorcard::calib::CalibrationCurve,
    corrected: Vec<[f32; 3]>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn rgb_rows(rows: &[[f32; 3]]) -> CliResult<Array2<f32>> {
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((rows.len(), 3), flat)?)
}

fn cmd_calibrate(
    targets: &Path,
    measured: &Path,
    mode: &str,
    values: &Path,
    output: Option<&Path>,
) -> CliResult<()> {
    let targets = Array1::from(read_json::<Vec<f32>>(targets)?);
    let measured = rgb_rows(&read_json::<Vec<[f32; 3]>>(measured)?)?;
    let values = rgb_rows(&read_json::<Vec<[f32; 3]>>(values)?)?;

    let curve = fit_named(targets.view(), measured.view(), mode)?;
    let corrected = curve.apply(values.view().into_dyn())?;
    let corrected = corrected
        .as_slice()
        .map(|s| {
            s.chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let json = serde_json::to_string_pretty(&CalibrationOutput { curve, corrected })?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
