//! Scenario definitions, execution and reporting
//!
//! Scenarios are YAML files describing an ordered list of questions and
//! the expected class of reply for each. The runner executes them against
//! one session and the report module renders per-step results and the
//! end-of-run summary.

pub mod config;
pub mod report;
pub mod runner;

pub use config::{ExpectedOutcome, Scenario, ScenarioStep, StepExpectation};
pub use report::{summarize, ConsoleReport, ReportSink, StepRecord, Summary};
pub use runner::{check_step, run_scenario, run_steps, RunOptions, RunOverrides, ScenarioReport};
