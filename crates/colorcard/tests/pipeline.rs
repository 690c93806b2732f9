use approx::assert_abs_diff_eq;
use colorcard::batch::{self, ImageReport, ReportOutcome};
use colorcard::core::{PixelRect, Quad};
use colorcard::detect::detect_regions;
use colorcard::grid::GridParams;
use colorcard::pipeline::{process_image, RegionSource};
use colorcard::{FeatureMode, PipelineConfig, PipelineError};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

const BACKGROUND: [u8; 3] = [30, 30, 30];
const REF_CARD: PixelRect = PixelRect {
    x0: 60,
    y0: 50,
    x1: 540,
    y1: 210,
};
const SAMPLE_CARD: PixelRect = PixelRect {
    x0: 60,
    y0: 300,
    x1: 540,
    y1: 460,
};
const PATCHES: [[[u8; 3]; 4]; 2] = [
    [[200, 180, 160], [150, 210, 190], [220, 140, 170], [170, 170, 230]],
    [[240, 200, 130], [160, 160, 160], [210, 230, 150], [190, 150, 200]],
];

fn sample_color(rgb: [u8; 3]) -> [u8; 3] {
    rgb.map(|v| (f32::from(v) * 0.9).round() as u8)
}

fn paint_card(img: &mut RgbImage, card: PixelRect, color: impl Fn([u8; 3]) -> [u8; 3]) {
    let (pw, ph) = (card.width() / 4, card.height() / 2);
    for y in card.y0..card.y1 {
        for x in card.x0..card.x1 {
            let row = ((y - card.y0) / ph) as usize;
            let col = ((x - card.x0) / pw) as usize;
            img.put_pixel(x as u32, y as u32, Rgb(color(PATCHES[row][col])));
        }
    }
}

/// Reference card above, sample card (10% darker) below, dark background.
fn two_card_photo() -> RgbImage {
    let mut img = RgbImage::from_pixel(600, 512, Rgb(BACKGROUND));
    paint_card(&mut img, REF_CARD, |c| c);
    paint_card(&mut img, SAMPLE_CARD, sample_color);
    img
}

fn config() -> PipelineConfig {
    let mut cfg = PipelineConfig {
        grid: GridParams {
            rows: 2,
            cols: 4,
            ..GridParams::default()
        },
        ..PipelineConfig::default()
    };
    cfg.features.normalize = false;
    cfg
}

fn near(a: PixelRect, b: PixelRect, tol: i32) -> bool {
    (a.x0 - b.x0).abs() <= tol
        && (a.y0 - b.y0).abs() <= tol
        && (a.x1 - b.x1).abs() <= tol
        && (a.y1 - b.y1).abs() <= tol
}

#[test]
fn detects_reference_above_sample() {
    let pair = detect_regions(&two_card_photo(), &config())
        .unwrap()
        .expect("two cards");
    let r = pair.reference.bounding_rect();
    let s = pair.sample.bounding_rect();
    assert!(near(r, REF_CARD, 3), "{r:?}");
    assert!(near(s, SAMPLE_CARD, 3), "{s:?}");
}

#[test]
fn detection_scales_back_from_working_height() {
    let img = two_card_photo();
    let cfg = PipelineConfig {
        target_height: 256,
        ..config()
    };
    let pair = detect_regions(&img, &cfg).unwrap().expect("two cards");
    // Half-resolution detection, so allow a few pixels of slack.
    assert!(near(pair.reference.bounding_rect(), REF_CARD, 6));
    assert!(near(pair.sample.bounding_rect(), SAMPLE_CARD, 6));
}

#[test]
fn extracts_patch_means_and_features() {
    let img = two_card_photo();
    let res = process_image(&img, &config(), &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(res.source, RegionSource::Detected);
    assert_eq!((res.ref_means.rows(), res.ref_means.cols()), (2, 4));

    for row in 0..2 {
        for col in 0..4 {
            let want_ref = PATCHES[row][col].map(f32::from);
            let want_sample = sample_color(PATCHES[row][col]).map(f32::from);
            let got_ref = res.ref_means.cell(row, col);
            let got_sample = res.sample_means.cell(row, col);
            for ch in 0..3 {
                assert_abs_diff_eq!(got_ref[ch], want_ref[ch], epsilon = 1e-3);
                assert_abs_diff_eq!(got_sample[ch], want_sample[ch], epsilon = 1e-3);
            }
        }
    }

    assert_eq!(res.features.mode, FeatureMode::LogRatio);
    assert_eq!(res.features.features.shape(), &[3, 2, 4]);
    // The sample card is darker everywhere.
    assert!(res.features.features.iter().all(|&v| v < 0.0 && v.is_finite()));
}

#[test]
fn same_seed_same_result() {
    let img = two_card_photo();
    let a = process_image(&img, &config(), &mut StdRng::seed_from_u64(9)).unwrap();
    let b = process_image(&img, &config(), &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn manual_boxes_cover_missed_detection() {
    let blank = RgbImage::from_pixel(200, 200, Rgb([90, 90, 90]));
    let err = process_image(&blank, &config(), &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));
    assert!(err.is_not_found() && !err.is_config_error());

    let cfg = PipelineConfig {
        manual_boxes: Some([
            Quad::from_rect(PixelRect::new(10, 10, 190, 90)),
            Quad::from_rect(PixelRect::new(10, 110, 190, 190)),
        ]),
        ..config()
    };
    let res = process_image(&blank, &cfg, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(res.source, RegionSource::Manual);
    assert_eq!(res.ref_means.cell(1, 3), [90.0, 90.0, 90.0]);
    assert!(res.features.extras.log_ratio.iter().all(|&v| v == 0.0));
}

#[test]
fn force_manual_skips_detection() {
    let img = two_card_photo();
    let swapped = [Quad::from_rect(SAMPLE_CARD), Quad::from_rect(REF_CARD)];
    let cfg = PipelineConfig {
        force_manual: true,
        manual_boxes: Some(swapped),
        ..config()
    };
    let res = process_image(&img, &cfg, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(res.source, RegionSource::Manual);
    assert_eq!(res.regions.reference, swapped[0]);
    // Reference is now the darker card, so the log-ratio is positive.
    assert!(res.features.features.iter().all(|&v| v > 0.0));
}

#[test]
fn annotation_draws_boxes_and_cells() {
    let img = two_card_photo();
    let res = process_image(&img, &config(), &mut StdRng::seed_from_u64(4)).unwrap();
    let mut canvas = img.clone();
    res.annotate(&mut canvas);

    let count = |color: [u8; 3]| canvas.pixels().filter(|p| p.0 == color).count();
    assert!(count([0, 255, 0]) > 0);
    assert!(count([0, 0, 255]) > 0);
    assert!(count([255, 0, 0]) > 0);
    assert!(count([255, 255, 0]) > 0);
    // Annotation never feeds back into the numbers.
    let again = process_image(&img, &config(), &mut StdRng::seed_from_u64(4)).unwrap();
    assert_eq!(res, again);
}

#[test]
fn batch_reports_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    std::fs::create_dir_all(input.join("session")).unwrap();
    two_card_photo().save(input.join("session/cards.png")).unwrap();
    RgbImage::from_pixel(64, 64, Rgb([50, 50, 50]))
        .save(input.join("blank.png"))
        .unwrap();

    let cfg = config();
    let paths = batch::find_images(&input).unwrap();
    assert_eq!(paths.len(), 2);

    let first = batch::process_batch(&paths, &cfg).unwrap();
    let second = batch::process_batch(&paths, &cfg).unwrap();
    assert_eq!(first.len(), 2);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.outcome.as_ref().ok(), b.outcome.as_ref().ok());
    }

    for item in &first {
        let report = ImageReport::from_item(item, cfg.save_extras);
        let path = batch::report_path(&input, &output, &item.path, "", "json");
        report.write_json(&path).unwrap();
        assert_eq!(ImageReport::load_json(&path).unwrap(), report);
    }

    let cards = ImageReport::load_json(output.join("session/cards.json")).unwrap();
    match cards.outcome {
        ReportOutcome::Ok(body) => {
            assert_eq!(body.source, RegionSource::Detected);
            assert!(body.extras.is_some());
            assert_eq!(body.features.shape(), &[3, 2, 4]);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let blank = ImageReport::load_json(output.join("blank.json")).unwrap();
    assert!(matches!(blank.outcome, ReportOutcome::Skipped { .. }));
}
