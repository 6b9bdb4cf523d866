//! Terminal output - plain ASCII, colored markers

use copilot_shared::{FinalResult, IngestResponse};
use owo_colors::OwoColorize;

use crate::eval::{CaseReport, Summary};

pub fn display_answer(result: &FinalResult) {
    println!();
    println!("[{}]", result.responder_name.cyan());
    println!();
    println!("{}", result.text);

    if !result.evidence.is_empty() {
        println!();
        println!("[SOURCES]");
        for item in &result.evidence {
            let score = item
                .relevance_score
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "-".to_string());
            println!("  * {} ({})", item.source_id.cyan(), score.dimmed());
        }
    }
    println!();
}

pub fn display_ingest(response: &IngestResponse) {
    if response.documents == 0 {
        println!("[WARN] {}", response.message.yellow());
    } else {
        println!(
            "[OK] {} ({} documents, {} chunks)",
            response.message.bright_green(),
            response.documents,
            response.chunks
        );
    }
}

pub fn display_case(report: &CaseReport) {
    let status = if report.pass {
        "PASS".bright_green().to_string()
    } else {
        "FAIL".bright_red().to_string()
    };
    println!(
        "[{}] {} | {}ms | agent={}",
        status,
        report.id,
        report.latency_ms,
        report.agent.as_deref().unwrap_or("-")
    );

    if !report.pass {
        println!(
            "  checks: ok_http={} has_sources={} source_hit={} agent_match={}",
            report.checks.ok_http,
            report.checks.has_sources,
            report.checks.source_hit,
            report.checks.agent_match
        );
        let files = report.source_files();
        if !files.is_empty() {
            println!("  sources: {}", files.join(", ").dimmed());
        }
        println!();
    }
}

pub fn display_summary(summary: &Summary) {
    println!();
    let line = format!(
        "{}/{} passed ({:.1}%), avg latency {}ms",
        summary.passed,
        summary.total,
        summary.pass_rate * 100.0,
        summary.avg_latency_ms
    );
    if summary.failed == 0 {
        println!("[OK] {}", line.bright_green());
    } else {
        println!("[FAIL] {}", line.bright_red());
    }
}

pub fn display_error(message: &str) {
    eprintln!();
    eprintln!("[ERROR] {}", message.red());
    eprintln!();
}
