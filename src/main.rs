use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use ticket_truth::{
    export_scores_csv, export_verdicts_csv, load_dataset_csv, score_dataset,
    score_dataset_simple, TruthfulnessEngine,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("score") => run_score(&args[2..], false),
        Some("detailed") => run_score(&args[2..], true),
        Some("check") => run_check(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("ticket-truth {}", ticket_truth::VERSION);
    println!();
    println!("Usage:");
    println!("  ticket-truth score <dataset.csv> [verdicts.csv]     Binary scores per record");
    println!("  ticket-truth detailed <dataset.csv> [verdicts.csv]  Full reconciliation metrics");
    println!("  ticket-truth check <input.txt> <output.txt>         Score a single text pair");
    println!();
    println!("Dataset CSV columns: id, created_at, inputs_json, outputs_json");
}

fn run_score(args: &[String], detailed: bool) -> Result<()> {
    let dataset_path = match args.first() {
        Some(path) => Path::new(path),
        None => bail!("missing dataset path (usage: ticket-truth score <dataset.csv> [out.csv])"),
    };

    println!("📂 Loading dataset: {}", dataset_path.display());
    let records = load_dataset_csv(dataset_path)?;
    println!("✓ Loaded {} records", records.len());

    let engine = TruthfulnessEngine::new();

    if detailed {
        let (rows, report) = score_dataset(&engine, &records);
        println!("✓ {}", report.summary());

        if let Some(out_path) = args.get(1) {
            export_verdicts_csv(Path::new(out_path), &rows)?;
            println!("💾 Verdicts written to: {}", out_path);
        } else {
            for row in &rows {
                println!(
                    "  {} -> {} ({}, {} refs, {} invalid)",
                    row.id,
                    row.truthfulness.score(),
                    row.format_detected,
                    row.output_reference_count,
                    row.invalid_reference_count
                );
            }
        }
    } else {
        let (rows, report) = score_dataset_simple(&engine, &records);
        println!("✓ {}", report.summary());

        if let Some(out_path) = args.get(1) {
            export_scores_csv(Path::new(out_path), &rows)?;
            println!("💾 Scores written to: {}", out_path);
        } else {
            for row in &rows {
                println!("  {} -> {}", row.id, row.truthfulness.score());
            }
        }
    }

    Ok(())
}

fn run_check(args: &[String]) -> Result<()> {
    let (input_path, output_path) = match (args.first(), args.get(1)) {
        (Some(input), Some(output)) => (input, output),
        _ => bail!("usage: ticket-truth check <input.txt> <output.txt>"),
    };

    let input_text = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read input file: {}", input_path))?;
    let output_text = fs::read_to_string(output_path)
        .with_context(|| format!("Failed to read output file: {}", output_path))?;

    let engine = TruthfulnessEngine::new();
    let report = engine.score_text_detailed(&input_text, &output_text);

    println!("{}", report.summary());
    println!("  format: {}", report.format_detected.as_str());
    if !report.invalid_references.is_empty() {
        let invalid: Vec<&str> = report.invalid_references.iter().map(|t| t.as_str()).collect();
        println!("  invalid references: {}", invalid.join(", "));
    }

    if report.is_truthful() {
        println!("✅ TRUTHFUL");
    } else {
        println!("❌ UNTRUTHFUL");
    }

    Ok(())
}
