//! Human-readable rendering of session results.

use docchat_knowledge::{IngestReport, QueryResponse};

pub fn print_ingest_report(report: &IngestReport) {
    println!(
        "Indexed {} chunks from {} pages in {} document(s) in {:.2}s",
        report.chunks,
        report.pages,
        report.documents.len(),
        report.elapsed_ms as f64 / 1000.0
    );
    for skipped in &report.skipped {
        eprintln!("Skipped {}: {}", skipped.source_id, skipped.reason);
    }
}

pub fn print_response(response: &QueryResponse) {
    println!("Answer:");
    println!("{}", response.answer);
    println!();

    if response.sources.is_empty() {
        println!("Sources: (no sources available)");
        return;
    }

    println!("Sources:");
    for source in &response.sources {
        println!(
            "- {}, page {} (score {:.3})",
            source.source_id, source.page_number, source.score
        );
        println!("  \"{}\"", source.excerpt.replace('\n', " "));
    }
}
