mod config;
mod discover;
mod report;
mod text;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use hudmatch::io::{encode_png, load_gray_image};
use hudmatch::{DetectionReport, Detector, ImageReport, ImageStatus, OwnedImage, TemplateStore};
use image::ImageFormat;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::report::{Output, TextOutcome};
use crate::text::TextRecognizer;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
pub(crate) const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "HUD marker detection over screenshot folders")]
struct Cli {
    /// Path to the JSON configuration file (built-in defaults when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable library spans and per-stage events.
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hudmatch=warn"));
    if cli.trace {
        filter = filter.add_directive("hudmatch=debug".parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    run(&config)
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let template_paths = discover::template_files(&config.templates_dir, &config.template_extension)?;
    let sources = template_paths.iter().map(|p| discover::template_source(p));
    let store = TemplateStore::load(sources, config.store_config())?;
    info!(
        "loaded {} templates from {}",
        store.len(),
        config.templates_dir.display()
    );

    let detector = Detector::new(
        Arc::new(store),
        config.canonical_config(),
        config.detector_config(),
    )?;
    let recognizer = text::from_config(&config.text)?;

    let examples = discover::list_files(&config.examples_dir, None).map_err(|err| {
        format!(
            "failed to read examples directory {}: {err}",
            config.examples_dir.display()
        )
    })?;
    fs::create_dir_all(&config.output_dir)?;

    let deadline = detector.deadline();
    let mut report = DetectionReport::default();
    let mut texts = Vec::with_capacity(examples.len());
    // One frame at a time; pairs within a frame run on the detector's pool.
    for path in &examples {
        let id = discover::file_name(path);
        let (image_report, text, canonical) =
            process_example(&detector, recognizer.as_deref(), path, id, deadline);

        log_outcome(&image_report, &text);
        if let (true, Some(canonical)) = (config.annotate, canonical) {
            let out = report::annotate(&canonical, image_report.status.detections())?;
            let out_path = config.output_dir.join(&image_report.id);
            info!("writing to {}", out_path.display());
            out.save_with_format(&out_path, ImageFormat::Png)?;
        }

        report.push(image_report);
        texts.push(text);
    }

    let json = serde_json::to_string_pretty(&Output::new(&report, texts))?;
    fs::write(config.output_dir.join("report.json"), json)?;
    println!("{}", report.summary());
    Ok(())
}

/// Decodes, canonicalizes and matches one example; text recognition runs on
/// its own thread over the same canonical image.
fn process_example(
    detector: &Detector,
    recognizer: Option<&dyn TextRecognizer>,
    path: &Path,
    id: String,
    deadline: Option<Instant>,
) -> (ImageReport, TextOutcome, Option<OwnedImage>) {
    let canonical = load_gray_image(path)
        .and_then(|img| detector.canonicalizer().canonicalize_source(&id, &img));
    let canonical = match canonical {
        Ok(canonical) => canonical,
        Err(error) => {
            let status = ImageStatus::Failed { error };
            return (ImageReport { id, status }, None, None);
        }
    };

    let image = &canonical;
    let (status, text) = thread::scope(|scope| {
        let text = recognizer.map(|r| scope.spawn(move || recognize(r, image)));
        let status = detector.detect_until(image.view(), deadline);
        let text = text.map(|handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err("text recognition panicked".to_string()))
        });
        (status, text)
    });

    (ImageReport { id, status }, text, Some(canonical))
}

fn recognize(
    recognizer: &dyn TextRecognizer,
    canonical: &OwnedImage,
) -> Result<Vec<text::TextAnnotation>, String> {
    let png = encode_png(canonical).map_err(|err| err.to_string())?;
    recognizer.recognize(&png).map_err(|err| err.to_string())
}

fn log_outcome(image: &ImageReport, text: &TextOutcome) {
    let id = image.id.as_str();
    for d in image.status.detections() {
        info!("{id}: {} - confidence {:.6}", d.template, d.confidence);
    }
    match &image.status {
        ImageStatus::Failed { error } => warn!("{id}: skipped: {error}"),
        ImageStatus::TimedOut { completed } => warn!(
            "{id}: timed out with {} completed detections",
            completed.len()
        ),
        ImageStatus::Processed { .. } => {}
    }
    match text {
        Some(Ok(annotations)) => {
            info!("{id}: {} text annotations", annotations.len());
            for a in annotations {
                debug!("{id}: text {:?}", a.text);
            }
        }
        Some(Err(err)) => warn!("{id}: text recognition failed: {err}"),
        None => {}
    }
}
