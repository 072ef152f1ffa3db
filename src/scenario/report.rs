//! Step records, run summary and console reporting

use std::time::Duration;

use colored::Colorize;

use crate::session::{StepOutcome, StepReply};

/// Recorded outcome of one executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub label: String,
    pub question: String,
    pub reply: StepReply,
    /// Expectation failures; empty means the step passed
    pub failures: Vec<String>,
    pub elapsed: Duration,
}

impl StepRecord {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated counts for a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub answered: usize,
    pub declined: usize,
    pub timed_out: usize,
    /// Steps with at least one expectation failure
    pub failed: usize,
    pub elapsed: Duration,
}

/// Reduce step records to a run summary
pub fn summarize(records: &[StepRecord]) -> Summary {
    let mut summary = Summary {
        answered: 0,
        declined: 0,
        timed_out: 0,
        failed: 0,
        elapsed: Duration::ZERO,
    };

    for record in records {
        match record.reply.outcome {
            StepOutcome::Answered(_) => summary.answered += 1,
            StepOutcome::Declined(_) => summary.declined += 1,
            StepOutcome::TimedOut => summary.timed_out += 1,
        }
        if !record.passed() {
            summary.failed += 1;
        }
        summary.elapsed += record.elapsed;
    }

    summary
}

/// Sink receiving each record as it is produced
///
/// Reporting is best-effort: implementations must not fail the run.
pub trait ReportSink {
    fn record(&mut self, record: &StepRecord);
}

/// Console reporter in the harness's CLI output style
pub struct ConsoleReport {
    pub verbose: bool,
}

impl ReportSink for ConsoleReport {
    fn record(&mut self, record: &StepRecord) {
        let mark = if record.passed() {
            "✓".green()
        } else {
            "✗".red()
        };

        println!(
            "  {} {}: {} ({} ms, {} typing)",
            mark,
            record.label.white().bold(),
            record.reply.outcome.name(),
            record.elapsed.as_millis(),
            record.reply.progress_signals,
        );

        match &record.reply.outcome {
            StepOutcome::Answered(answer) => {
                println!("      {}", answer.content.dimmed());
                if self.verbose {
                    if let Some(intent) = &answer.intent {
                        println!(
                            "      intent: {} ({:.2})",
                            intent.category.dimmed(),
                            intent.confidence
                        );
                    }
                    if let Some(metadata) = &answer.metadata {
                        println!(
                            "      processed in {} ms, sources: {}",
                            metadata.processing_time,
                            metadata.data_sources.join(", ").dimmed()
                        );
                    }
                    if !answer.suggestions.is_empty() {
                        println!("      suggestions: {}", answer.suggestions.join(" | ").dimmed());
                    }
                }
            }
            StepOutcome::Declined(decline) => {
                println!("      declined: {}", decline.message.dimmed());
            }
            StepOutcome::TimedOut => {}
        }

        for failure in &record.failures {
            println!("      {} {}", "-".red(), failure);
        }
    }
}
