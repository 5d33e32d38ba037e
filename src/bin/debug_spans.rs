use pdf_hidden_text::classifier::classify_span;
use pdf_hidden_text::{DocumentSource, PageRangeSet, PdfDocument, DEFAULT_TOLERANCE};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_spans <pdf_path> [page-range]");
        std::process::exit(1);
    }

    let doc = PdfDocument::open(&args[1]).expect("Failed to load PDF");
    let selection = PageRangeSet::parse(args.get(2).map(|s| s.as_str()), doc.page_count())
        .expect("Invalid page range");

    for page in selection.iter() {
        let spans = doc.spans(page).expect("Failed to extract spans");
        let raster = doc.raster(page, 1.0).expect("Failed to rasterize");
        println!(
            "=== PAGE {} ({} spans, {}x{} px) ===",
            page,
            spans.len(),
            raster.width(),
            raster.height()
        );
        for span in spans {
            let r = classify_span(span, &raster, DEFAULT_TOLERANCE);
            let bg = r
                .background
                .map(|c| format!("#{:06x}", c.packed()))
                .unwrap_or_else(|| format!("{:?}", r.status));
            println!(
                "  {} x={:7.1}..{:7.1} y={:7.1}..{:7.1} fs={:5.1} fg=#{:06x} bg={:<11} text={:?}",
                if r.is_hidden { "H" } else { " " },
                r.span.bbox.x0,
                r.span.bbox.x1,
                r.span.bbox.y0,
                r.span.bbox.y1,
                r.span.font_size,
                r.span.color.packed(),
                bg,
                r.span.text
            );
        }
        println!();
    }
}
