// Ticket Truth - Core Library
// Exposes all modules for use in the CLI and tests

pub mod envelope;
pub mod feed;
pub mod matcher;
pub mod records;
pub mod scoring;
pub mod section;

// Re-export commonly used types
pub use envelope::{
    select_input_text, select_output_text, extract_output_references, EnvelopeError,
};
pub use feed::{extract_ground_truth_tickets, parse_feed, FeedOutcome};
pub use matcher::{TicketId, TicketMatcher};
pub use records::{
    load_dataset_csv, score_dataset, score_dataset_simple,
    export_scores_csv, export_verdicts_csv,
    BatchReport, DatasetRecord, ScoreRow, VerdictRow,
};
pub use scoring::{
    score_truthfulness, score_truthfulness_detailed,
    DetectedFormat, EvaluationReport, TruthfulnessEngine, Verdict,
};
pub use section::{extract_ticket_section, ExtractedSection, END_DELIMITER, START_DELIMITER};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
