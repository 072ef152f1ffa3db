//! Scenario execution
//!
//! Drives an ordered list of steps through one session. A step that times
//! out or gets declined never aborts the run; only connection-level faults
//! stop it, and the completed records are still returned so one bad step
//! cannot hide the results of the ones before it.

use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::common::{Config, Error, Result};
use crate::session::{collect_reply, AggregatorOptions, ChatSession, StepOutcome};

use super::config::{Scenario, ScenarioStep};
use super::report::{summarize, ConsoleReport, ReportSink, StepRecord, Summary};

/// Settings for one run of a step sequence
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Requester id stamped on every outbound question
    pub user_id: String,
    pub aggregator: AggregatorOptions,
    /// Pause between steps; the protocol does not support pipelining
    pub inter_step_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            user_id: "chatprobe".to_string(),
            aggregator: AggregatorOptions::default(),
            inter_step_delay: Duration::from_secs(1),
        }
    }
}

/// CLI-level overrides applied on top of scenario file and config file
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub endpoint: Option<String>,
    pub user_id: Option<String>,
    pub receive_timeout_secs: Option<u64>,
}

/// Result of running a whole scenario file
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: String,
    pub steps_total: usize,
    pub records: Vec<StepRecord>,
    /// Connection-level fault that stopped the run early, if any
    pub aborted: Option<String>,
    pub summary: Summary,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.aborted.is_none() && self.summary.failed == 0
    }
}

/// Execute steps in order against an open session
///
/// Returns the records produced so far together with the fatal error, if
/// one stopped the run. Output ordering matches input ordering.
pub async fn run_steps(
    session: &mut ChatSession,
    steps: &[ScenarioStep],
    options: &RunOptions,
    sink: &mut dyn ReportSink,
) -> (Vec<StepRecord>, Option<Error>) {
    let mut records = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(options.inter_step_delay).await;
        }

        tracing::info!(label = %step.label, "sending question");
        let started = Instant::now();

        if let Err(e) = session.ask(&step.question, &options.user_id).await {
            return (records, Some(e));
        }

        let reply = match collect_reply(session, &options.aggregator).await {
            Ok(reply) => reply,
            Err(e) => return (records, Some(e)),
        };

        let record = StepRecord {
            label: step.label.clone(),
            question: step.question.clone(),
            failures: check_step(step, &reply),
            reply,
            elapsed: started.elapsed(),
        };

        sink.record(&record);
        records.push(record);
    }

    (records, None)
}

/// Check a step's expectations against its reply
pub fn check_step(step: &ScenarioStep, reply: &crate::session::StepReply) -> Vec<String> {
    let mut failures = Vec::new();

    let Some(expect) = &step.expect else {
        // No expectations: any terminal envelope counts as success
        if reply.outcome == StepOutcome::TimedOut {
            failures.push("no terminal envelope arrived".to_string());
        }
        return failures;
    };

    if let Some(expected) = expect.outcome {
        if expected.name() != reply.outcome.name() {
            failures.push(format!(
                "expected outcome {}, got {}",
                expected.name(),
                reply.outcome.name()
            ));
        }
    }

    if let Some(min_typing) = expect.min_typing {
        if reply.progress_signals < min_typing {
            failures.push(format!(
                "expected at least {} typing signal(s), saw {}",
                min_typing, reply.progress_signals
            ));
        }
    }

    let content_checks = expect.content_contains.is_some()
        || expect.category.is_some()
        || expect.min_confidence.is_some()
        || expect.suggests.is_some();

    let answer = match &reply.outcome {
        StepOutcome::Answered(answer) => answer,
        _ => {
            if content_checks && expect.outcome != Some(super::config::ExpectedOutcome::Declined) {
                failures.push(format!(
                    "content expectations set but step {}",
                    reply.outcome.name()
                ));
            }
            return failures;
        }
    };

    if let Some(needle) = &expect.content_contains {
        if !answer.content.contains(needle.as_str()) {
            failures.push(format!(
                "answer does not contain '{}'. Got: '{}'",
                needle, answer.content
            ));
        }
    }

    if let Some(category) = &expect.category {
        let actual = answer.intent.as_ref().map(|i| i.category.as_str());
        if actual != Some(category.as_str()) {
            failures.push(format!(
                "expected intent category '{}', got '{}'",
                category,
                actual.unwrap_or("none")
            ));
        }
    }

    if let Some(min_confidence) = expect.min_confidence {
        let actual = answer.intent.as_ref().map(|i| i.confidence).unwrap_or(0.0);
        if actual < min_confidence {
            failures.push(format!(
                "expected confidence >= {min_confidence}, got {actual}"
            ));
        }
    }

    if let Some(needle) = &expect.suggests {
        if !answer
            .suggestions
            .iter()
            .any(|s| s.contains(needle.as_str()))
        {
            failures.push(format!(
                "no suggestion contains '{}'. Got: {:?}",
                needle, answer.suggestions
            ));
        }
    }

    failures
}

/// Run a scenario from a YAML file
pub async fn run_scenario(
    path: &Path,
    overrides: &RunOverrides,
    verbose: bool,
) -> Result<ScenarioReport> {
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    let scenario: Scenario = serde_yaml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config = Config::load()?;

    let endpoint = overrides
        .endpoint
        .clone()
        .or_else(|| scenario.endpoint.clone())
        .unwrap_or_else(|| config.endpoint.clone());
    let receive_secs = overrides
        .receive_timeout_secs
        .unwrap_or(config.timeouts.receive_secs);
    let options = RunOptions {
        user_id: overrides
            .user_id
            .clone()
            .or_else(|| scenario.user_id.clone())
            .unwrap_or_else(|| config.user_id.clone()),
        aggregator: AggregatorOptions {
            receive_timeout: Duration::from_secs(receive_secs),
            max_messages: config.limits.max_messages_per_step,
        },
        inter_step_delay: Duration::from_millis(config.limits.inter_step_delay_ms),
    };

    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    println!("\n{}", "Connecting:".cyan());
    let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);
    let mut session = ChatSession::connect(&endpoint, connect_timeout).await?;
    println!(
        "  {} {} (session {})",
        "✓".green(),
        endpoint.dimmed(),
        session.session_id().dimmed()
    );
    if verbose && !session.greeting().is_empty() {
        println!("  {}", session.greeting().dimmed());
    }

    println!("\n{}", "Steps:".cyan());
    let mut sink = ConsoleReport { verbose };
    let (records, fatal) = run_steps(&mut session, &scenario.steps, &options, &mut sink).await;
    session.close().await;

    let summary = summarize(&records);

    println!(
        "\n{} answered: {}  declined: {}  no response: {}  ({} ms)",
        "Summary:".cyan(),
        summary.answered,
        summary.declined,
        summary.timed_out,
        summary.elapsed.as_millis()
    );

    if let Some(fatal) = &fatal {
        println!(
            "\n{} {} after {} of {} steps: {}\n",
            "✗".red().bold(),
            "Connection lost".red().bold(),
            records.len(),
            steps_total,
            fatal
        );
    } else if summary.failed > 0 {
        println!(
            "\n{} {} ({} step(s) failed)\n",
            "✗".red().bold(),
            "Scenario Failed".red().bold(),
            summary.failed
        );
    } else {
        println!("\n{} {}\n", "✓".green().bold(), "Scenario Passed".green().bold());
    }

    Ok(ScenarioReport {
        name: scenario.name,
        steps_total,
        records,
        aborted: fatal.map(|e| e.to_string()),
        summary,
    })
}
