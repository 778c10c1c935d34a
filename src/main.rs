mod classify;
mod merge;
mod ocr;
mod parser;
mod report;
mod source;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::warn;

use parser::candidate::Candidate;
use parser::patterns::PatternLibrary;
use source::{DocumentSource, DumpSource, PageContent, PdfSource};

#[derive(Parser)]
#[command(name = "harness_extract", about = "Component inventory extractor for wiring-harness drawings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract components from a digital document (.pdf or .json page dump)
    Analyze {
        input: PathBuf,
        /// Max pages to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Write the full JSON export here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the per-component CSV here
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Extract components from pre-rendered page images via tesseract
    Ocr {
        /// Directory of page images, one page per file, ordered by filename
        images: PathBuf,
        /// Path to the tesseract binary (default: resolved from PATH)
        #[arg(long)]
        tesseract: Option<PathBuf>,
        /// Write the full JSON export here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the per-component CSV here
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Summarize a previously written JSON export
    Report { input: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { input, limit, json, csv } => {
            let src = open_source(&input)?;
            let pages = source::collect_pages(src.as_ref(), limit);
            if pages.is_empty() {
                println!("Document has no pages.");
                return Ok(());
            }
            println!("Extracting from {} pages...", pages.len());
            let components = extract_pages(&pages);
            finish(&components, json.as_deref(), csv.as_deref())
        }
        Commands::Ocr { images, tesseract, json, csv } => {
            let engine = ocr::TesseractCli::new(tesseract)?;
            let files = list_image_files(&images)?;
            if files.is_empty() {
                println!("No image files found in {}.", images.display());
                return Ok(());
            }
            println!("Recognizing {} page images...", files.len());
            let components = extract_image_files(&engine, &files);
            finish(&components, json.as_deref(), csv.as_deref())
        }
        Commands::Report { input } => {
            let export = report::read_json(&input)?;
            println!("导出时间: {}", export.metadata.export_time);
            println!("元器件总数: {}", export.metadata.total_components);
            println!("\n按类别:");
            for (category, count) in export.category_counts() {
                if count > 0 {
                    println!("  {category}: {count}");
                }
            }
            println!("\n按系统:");
            for (system, count) in export.system_counts() {
                if count > 0 {
                    println!("  {system}: {count}");
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_source(input: &Path) -> anyhow::Result<Box<dyn DocumentSource>> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfSource::open(input)?)),
        "json" => Ok(Box::new(DumpSource::open(input)?)),
        other => bail!("unsupported input format {other:?} (expected .pdf or .json)"),
    }
}

/// Per-page extraction in parallel, then one sequential merge pass so the
/// deduplicated output is deterministic.
fn extract_pages(pages: &[PageContent]) -> Vec<Candidate> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let lib = PatternLibrary::global();
    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let per_page: Vec<Vec<Candidate>> = pages
        .par_iter()
        .map(|page| {
            let candidates = parser::extract_page(page, lib);
            pb.inc(1);
            candidates
        })
        .collect();
    pb.finish_and_clear();

    merge::merge(per_page.into_iter().flatten().collect())
}

/// OCR path: each image file is one page carrying a single pre-rendered
/// image. A file that cannot be read is its page's problem only: the page
/// stays at zero candidates and the run continues.
fn extract_image_files(engine: &dyn ocr::OcrEngine, files: &[PathBuf]) -> Vec<Candidate> {
    let lib = PatternLibrary::global();
    let mut raw = Vec::new();

    for (idx, file) in files.iter().enumerate() {
        let page = idx as u32 + 1;
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(page, file = %file.display(), error = %e, "image unreadable, recording page as empty");
                continue;
            }
        };
        raw.extend(ocr::extract_images(engine, page, &[bytes], lib));
    }

    merge::merge(raw)
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

fn list_image_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading image directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn finish(
    components: &[Candidate],
    json: Option<&Path>,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    println!("{}", report::render(components));

    if let Some(path) = json {
        let export = report::build_export(components);
        report::write_json(path, &export)?;
        println!("JSON export: {}", path.display());
    }
    if let Some(path) = csv {
        report::write_csv(path, components)?;
        println!("CSV export: {} ({} rows)", path.display(), components.len());
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
