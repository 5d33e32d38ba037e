//! CLI tool to find hidden text in a PDF
//!
//! Flags every text span whose color matches the background beneath it,
//! writes highlighted page images plus an HTML rendering, and prints a
//! summary or a JSON report.
//!
//! # Usage
//!
//! ```bash
//! find-hidden document.pdf
//! find-hidden document.pdf --pages 1,3-5 --tolerance 20 --output-dir ./out
//! find-hidden document.pdf --json
//! ```

use clap::Parser;
use pdf_hidden_text::{inspect_pdf_with_config, InspectOptions, PageOutcome};
use std::fs;
use std::path::PathBuf;

/// Find text whose color blends into the page background
#[derive(Parser, Debug)]
#[command(name = "find-hidden")]
#[command(version, about, long_about = None)]
struct Args {
    /// PDF file to inspect
    pdf: PathBuf,

    /// Pages to inspect, e.g. "1,3-5" (default: all)
    #[arg(short, long)]
    pages: Option<String>,

    /// Per-channel color tolerance
    #[arg(short, long, default_value = "30", env = "HIDDEN_TEXT_TOLERANCE")]
    tolerance: u8,

    /// Render scale (at least 1.0)
    #[arg(short, long, default_value = "1.0", env = "HIDDEN_TEXT_SCALE")]
    scale: f32,

    /// Directory for highlighted page images and highlighted.html
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let options = InspectOptions {
        tolerance: args.tolerance,
        scale: args.scale,
        pages: args.pages.clone(),
        parallel: !args.sequential,
    };

    let report = match inspect_pdf_with_config(&args.pdf, &options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        for (i, page) in report.inspected().enumerate() {
            let path = dir.join(format!("highlighted_page_{}.png", i));
            page.annotated.save_png(&path)?;
            if args.verbose {
                eprintln!("Wrote {}", path.display());
            }
        }
        let html_path = dir.join("highlighted.html");
        fs::write(&html_path, report.combined_markup())?;
        if args.verbose {
            eprintln!("Wrote {}", html_path.display());
        }
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("Hidden Text Report");
    println!("==================");
    println!("File: {}", args.pdf.display());
    println!("Pages: {} ({} selected)", report.page_count, report.pages.len());
    println!("Tolerance: {}  Scale: {}", report.tolerance, report.scale);
    println!("Processing time: {}ms", report.processing_time_ms);
    println!();

    for outcome in &report.pages {
        match outcome {
            PageOutcome::Inspected(page) => {
                println!(
                    "Page {}: {} spans, {} hidden",
                    page.page,
                    page.results.len(),
                    page.hidden.len()
                );
                for (text, bbox) in page.hidden.texts.iter().zip(&page.hidden.bboxes) {
                    println!(
                        "  [{:7.1} {:7.1} {:7.1} {:7.1}] {:?}",
                        bbox.x0, bbox.y0, bbox.x1, bbox.y1, text
                    );
                }
            }
            PageOutcome::Failed { page, error } => {
                println!("Page {}: FAILED ({})", page, error);
            }
        }
    }

    println!();
    println!(
        "Total: {} hidden of {} spans",
        report.hidden_count(),
        report.span_count()
    );

    Ok(())
}
