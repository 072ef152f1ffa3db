//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Endpoint override; falls back to the config file when absent
    pub endpoint: Option<String>,
    /// Requester id override for outbound messages
    pub user_id: Option<String>,
    /// The ordered exchanges to run
    pub steps: Vec<ScenarioStep>,
}

/// One planned exchange: a question and what we expect back
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioStep {
    /// Human-readable identifier for reporting
    pub label: String,
    /// Question text sent verbatim
    pub question: String,
    /// Optional expectations; without them any terminal outcome passes
    pub expect: Option<StepExpectation>,
}

/// Expected outcome class of a step
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    Answered,
    Declined,
    TimedOut,
}

impl ExpectedOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            ExpectedOutcome::Answered => "answered",
            ExpectedOutcome::Declined => "declined",
            ExpectedOutcome::TimedOut => "timed_out",
        }
    }
}

/// Assertions checked against one step's reply
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StepExpectation {
    /// Expected outcome class
    pub outcome: Option<ExpectedOutcome>,
    /// Substring that must appear in the answer content
    pub content_contains: Option<String>,
    /// Expected intent category (exact match)
    pub category: Option<String>,
    /// Minimum intent confidence
    pub min_confidence: Option<f64>,
    /// Substring that must appear among the offered suggestions
    pub suggests: Option<String>,
    /// Minimum number of typing indicators before the terminal envelope,
    /// a liveness floor for non-trivial answers
    pub min_typing: Option<u32>,
}
