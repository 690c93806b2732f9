use std::{env, path::PathBuf, time::Instant};

use colorcard::batch::{load_rgb, BatchItem, ImageReport};
use colorcard::pipeline::process_image;
use colorcard::PipelineConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Usage: `extract_one <image> [config.json] [annotated.png]`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    colorcard::core::init_with_level(log::LevelFilter::Info)?;

    let mut args = env::args().skip(1);
    let image_path = PathBuf::from(args.next().ok_or("missing image path")?);
    let cfg = match args.next() {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };
    let annotated = args.next().map(PathBuf::from);

    let img = load_rgb(&image_path)?;
    let started = Instant::now();
    let outcome = process_image(&img, &cfg, &mut StdRng::seed_from_u64(cfg.seed));
    log::info!("extraction took {:.1} ms", started.elapsed().as_secs_f64() * 1e3);

    if let (Ok(result), Some(path)) = (&outcome, annotated) {
        let mut canvas = img.clone();
        result.annotate(&mut canvas);
        canvas.save(&path)?;
        log::info!("annotated image written to {}", path.display());
    }

    let item = BatchItem {
        path: image_path,
        seed: cfg.seed,
        outcome,
    };
    let report = ImageReport::from_item(&item, cfg.save_extras);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
